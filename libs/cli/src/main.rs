#[cfg(dummy)] // Needed for IntelliJ autocomplete
extern crate obf_mappings as mappings;
#[macro_use]
extern crate clap;
extern crate failure;
extern crate env_logger;

use std::path::{Path, PathBuf};
use std::io::{self, BufWriter, Write};
use std::fs::File;
use std::str::FromStr;

use failure::{Error, bail};
use failure_derive::Fail;
use log::{info, debug};

use mappings::{Table, Kind, DialectSpec, InvalidDialect, MappingsFormat, combine_mcp};
use mappings::format::{SrgFormat, McpCsvFormat, BlObfFormat, BOTH_SIDES};

fn app() -> clap::App<'static, 'static> {
    clap_app!(obf_mappings =>
        (version: crate_version!())
        (author: crate_authors!())
        (about: crate_description!())
        (@setting SubcommandRequiredElseHelp)
        (@subcommand convert =>
            (about: "Convert mappings from one or more dialects into another")
            (@arg to: --to +takes_value +required "The dialect to write the mappings in")
            (@arg out: --out +takes_value +required "The file to write the mappings to")
            (@arg three_way: --("three-way") "Keep the intermediate names of the mappings")
            (@arg overwrite: --overwrite "Replace the mappings of earlier inputs with later ones")
            (@arg inputs: +required +multiple "The mappings to load, like srg=joined.srg")
        )
        (@subcommand generate =>
            (about: "Generate three-way mappings from an MCP config directory")
            (@arg mcp_dir: +required "The directory with joined.srg, fields.csv and methods.csv")
            (@arg out: +required "The file to write the mappings to")
            (@arg side: --side +takes_value "The side to generate mappings for (0 client, 1 server, 2 both), defaulting to the client")
        )
        (@subcommand dump =>
            (about: "Print mappings as JSON")
            (@arg three_way: --("three-way") "Keep the intermediate names of the mappings")
            (@arg inputs: +required +multiple "The mappings to load, like srg=joined.srg")
        )
    )
}

fn main() -> Result<(), Error> {
    ::env_logger::init();
    let matches = app().get_matches();
    match matches.subcommand() {
        ("convert", Some(matches)) => {
            let inputs: Vec<InputSpec> = values_t!(matches, "inputs", InputSpec)
                .unwrap_or_else(|e| e.exit());
            let target = value_t!(matches, "to", DialectSpec)
                .unwrap_or_else(|e| e.exit());
            let out = PathBuf::from(matches.value_of("out").unwrap());
            let table = load_inputs(
                &inputs,
                matches.is_present("three_way"),
                matches.is_present("overwrite")
            )?;
            let format = target.create();
            store(&*format, &table, &out)?;
            info!("Wrote {} mappings to {} as {}", table.len(), out.display(), target);
        },
        ("generate", Some(matches)) => {
            let mcp_dir = PathBuf::from(matches.value_of("mcp_dir").unwrap());
            let out = PathBuf::from(matches.value_of("out").unwrap());
            let side = parse_side(matches).unwrap_or_else(|e| e.exit());
            let table = generate(&mcp_dir, side)?;
            store(&BlObfFormat::new(), &table, &out)?;
            info!("Wrote {} mappings to {}", table.len(), out.display());
        },
        ("dump", Some(matches)) => {
            let inputs: Vec<InputSpec> = values_t!(matches, "inputs", InputSpec)
                .unwrap_or_else(|e| e.exit());
            let table = load_inputs(&inputs, matches.is_present("three_way"), false)?;
            let stdout = io::stdout();
            let mut stdout = stdout.lock();
            ::serde_json::to_writer_pretty(&mut stdout, &table)?;
            writeln!(stdout)?;
        },
        _ => unreachable!()
    }
    Ok(())
}

fn load_inputs(inputs: &[InputSpec], three_way: bool, overwrite: bool) -> Result<Table, Error> {
    let three_way = three_way || inputs.iter().any(|input| input.dialect.has_intermediate_names());
    let mut table = if three_way { Table::with_intermediate() } else { Table::new() };
    for input in inputs {
        let before = table.len();
        input.dialect.create().load_path(&input.path, &mut table, overwrite)?;
        debug!("Loaded {} mappings from {}", table.len() - before, input.path.display());
    }
    Ok(table)
}

fn store(format: &dyn MappingsFormat, table: &Table, out: &Path) -> Result<(), Error> {
    let mut writer = BufWriter::new(File::create(out)?);
    format.store(table, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// The side to generate mappings for, which is the client unless specified
fn parse_side(matches: &clap::ArgMatches) -> Result<u32, clap::Error> {
    if matches.is_present("side") {
        value_t!(matches, "side", u32)
    } else {
        Ok(0)
    }
}

/// Combine the srg names of an MCP config with its human-readable names
fn generate(mcp_dir: &Path, side: u32) -> Result<Table, Error> {
    let srg_side = match side {
        0 => Some("C"),
        1 => Some("S"),
        BOTH_SIDES => None,
        _ => bail!("Invalid side {}", side)
    };
    let srg_format = match srg_side {
        Some(srg_side) => SrgFormat::new().with_side(srg_side),
        None => SrgFormat::new()
    };
    let csv_side = if side == BOTH_SIDES { None } else { Some(side) };
    let mut srg = Table::new();
    srg_format.load_path(&mcp_dir.join("joined.srg"), &mut srg, false)?;
    let mut names = Table::new();
    for &kind in &[Kind::Field, Kind::Method] {
        let mut format = McpCsvFormat::new(kind);
        if let Some(side) = csv_side {
            format = format.with_side(side);
        }
        let file = if kind == Kind::Field { "fields.csv" } else { "methods.csv" };
        format.load_path(&mcp_dir.join(file), &mut names, true)?;
    }
    Ok(combine_mcp(&srg, &names))
}

/// A file to load in the specified dialect, given like `srg=joined.srg`
#[derive(Debug)]
struct InputSpec {
    dialect: DialectSpec,
    path: PathBuf
}
impl FromStr for InputSpec {
    type Err = InvalidInput;

    fn from_str(s: &str) -> Result<InputSpec, InvalidInput> {
        let separator = s.find('=').ok_or_else(|| InvalidInput::MissingDialect(s.into()))?;
        let dialect = s[..separator].parse::<DialectSpec>()?;
        let path = &s[(separator + 1)..];
        if path.is_empty() {
            return Err(InvalidInput::MissingPath(s.into()))
        }
        Ok(InputSpec { dialect, path: PathBuf::from(path) })
    }
}

#[derive(Debug, Fail)]
enum InvalidInput {
    #[fail(display = "Missing dialect for input {:?}", _0)]
    MissingDialect(String),
    #[fail(display = "Missing path for input {:?}", _0)]
    MissingPath(String),
    #[fail(display = "{}", _0)]
    Dialect(#[cause] InvalidDialect)
}
impl From<InvalidDialect> for InvalidInput {
    #[inline]
    fn from(e: InvalidDialect) -> Self {
        InvalidInput::Dialect(e)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn parse_inputs() {
        let input: InputSpec = "srg-C=mappings/joined.srg".parse().unwrap();
        assert_eq!(input.dialect, DialectSpec::Srg { side: Some("C".into()), strip_descriptors: false });
        assert_eq!(input.path, PathBuf::from("mappings/joined.srg"));
        // Only the first separator splits the dialect from the path
        let input: InputSpec = "onf=a=b.onf".parse().unwrap();
        assert_eq!(input.path, PathBuf::from("a=b.onf"));
        assert!("joined.srg".parse::<InputSpec>().is_err());
        assert!("srg=".parse::<InputSpec>().is_err());
        assert!("json=mappings.json".parse::<InputSpec>().is_err());
    }
    #[test]
    fn generate_sides() {
        let side = |args: &[&str]| {
            let mut full = vec!["obf-mappings", "generate", "mcp", "out.blobf"];
            full.extend_from_slice(args);
            let matches = app().get_matches_from_safe(full).unwrap();
            parse_side(matches.subcommand_matches("generate").unwrap())
        };
        assert_eq!(side(&[]).unwrap(), 0);
        assert_eq!(side(&["--side", "1"]).unwrap(), 1);
        assert_eq!(side(&["--side", "2"]).unwrap(), BOTH_SIDES);
        assert!(side(&["--side", "client"]).is_err());
    }
}
