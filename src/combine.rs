//! Combining the srg names of the obfuscated members with their MCP names.
use log::debug;

use crate::{Kind, Table};
use crate::descriptor::split_member;

/// Build a three-way table from the obf to searge names of `srg`,
/// and the searge to human-readable names of `names`.
///
/// Packages and classes are taken directly from the srg names.
/// The intermediate name of each field and method is its srg name,
/// with its deobfuscated name replacing the searge part of the name with the MCP name.
/// Members without any MCP name keep their searge name.
pub fn combine_mcp(srg: &Table, names: &Table) -> Table {
    let mut result = Table::with_intermediate();
    for &kind in &[Kind::Package, Kind::Class] {
        for entry in srg.try_mappings(kind).into_iter().flat_map(|mappings| mappings.iter()) {
            result.add_two_way(entry.obf(), entry.deobf(), kind, false);
        }
    }
    for &kind in &[Kind::Field, Kind::Method] {
        let mcp_names = names.try_mappings(kind);
        let (mut renamed, mut total) = (0, 0);
        for entry in srg.try_mappings(kind).into_iter().flat_map(|mappings| mappings.iter()) {
            let (name, descriptor) = split_member(entry.deobf());
            // The searge name follows the owner, separated by either a dot or a space
            let start = name.rfind(|c: char| c == '.' || c == ' ').map_or(0, |index| index + 1);
            let searge = &name[start..];
            let mcp = mcp_names.and_then(|mappings| mappings.by_obf(searge))
                .map(|mcp| mcp.deobf());
            if mcp.is_some() {
                renamed += 1;
            }
            let mut deobf = format!("{}{}", &name[..start], mcp.unwrap_or(searge));
            if let Some(descriptor) = descriptor {
                deobf.push(' ');
                deobf.push_str(descriptor);
            }
            result.add_three_way(entry.obf(), entry.deobf(), deobf, kind, false);
            total += 1;
        }
        debug!("Found MCP names for {} of {} {} names", renamed, total, kind);
    }
    result
}
