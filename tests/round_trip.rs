extern crate obf_mappings as mappings;
extern crate serde_json;

use std::fs;

use mappings::{Table, Kind, DialectSpec, MappingsFormat, MappingsError, combine_mcp};
use mappings::descriptor::{obfuscate_descriptor, deobfuscate_descriptor};
use mappings::format::{
    ObfFormat, SidedObfFormat, BlObfFormat, SrgFormat,
    McpCsvFormat, OnfFormat, EnigmaFormat
};
use mappings::format::import::MemoryImporter;

const CLASSES: &str = "\
CLASS:a.b=net.minecraft.World
CLASS:a.e=net.minecraft.Entity
FIELD:a.b.c=net.minecraft.World.time
METHOD:a.b.d (La/b;)V=net.minecraft.World.tick (Lnet/minecraft/World;)V
METHOD:a.e.f (La/b;I)La/e;=net.minecraft.Entity.spawn (Lnet/minecraft/World;I)Lnet/minecraft/Entity;
";
const THREE_WAY: &str = "\
PACKAGE:a:net.minecraft:net.minecraft
CLASS:a.b:net.minecraft.World:net.minecraft.World
FIELD:a.b.c:net.minecraft.World.field_1_c:net.minecraft.World.time
METHOD:a.b.d:(La/b;)V:net.minecraft.World.func_2_d:(Lnet/minecraft/World;)V:net.minecraft.World.tick:(Lnet/minecraft/World;)V
";

fn load(format: &dyn MappingsFormat, text: &str, table: Table) -> Table {
    let mut table = table;
    format.load(text, &mut table, false).unwrap();
    table
}

fn two_way(text: &str) -> Table {
    load(&ObfFormat, text, Table::new())
}

fn with_packages() -> Table {
    two_way(&format!("PACKAGE:a=net.minecraft\n{}", CLASSES))
}

fn assert_equivalent(actual: &Table, expected: &Table) {
    assert_eq!(
        serde_json::to_value(actual).unwrap(),
        serde_json::to_value(expected).unwrap()
    );
}

fn assert_round_trip(format: &dyn MappingsFormat, table: &Table) {
    let text = format.store_string(table).unwrap();
    let empty = if table.has_intermediate_names() { Table::with_intermediate() } else { Table::new() };
    let reloaded = load(format, &text, empty);
    assert_equivalent(&reloaded, table);
}

#[test]
fn flat_round_trip() {
    assert_round_trip(&ObfFormat, &with_packages());
    assert_round_trip(&SidedObfFormat::new("client"), &with_packages());
}

#[test]
fn srg_round_trip() {
    assert_round_trip(&SrgFormat::new(), &with_packages());
    assert_round_trip(&SrgFormat::new().with_side("C"), &with_packages());
}

#[test]
fn three_way_round_trip() {
    let table = load(&BlObfFormat::new(), THREE_WAY, Table::with_intermediate());
    assert_eq!(
        table.lookup_intermediate("a.b.c", Kind::Field).unwrap(),
        Some("net.minecraft.World.field_1_c")
    );
    assert_round_trip(&BlObfFormat::new(), &table);
}

#[test]
fn onf_round_trip_with_packages() {
    let table = load(&BlObfFormat::new(), THREE_WAY, Table::with_intermediate());
    let text = OnfFormat::new().store_string(&table).unwrap();
    assert!(text.starts_with("a:net.minecraft\n\tb:World\n"));
    assert_round_trip(&OnfFormat::new(), &table);
}

#[test]
fn csv_round_trip() {
    let mut table = Table::new();
    table.add_two_way("field_1_c", "time", Kind::Field, false);
    table.add_two_way("field_3_g", "health", Kind::Field, false);
    assert_round_trip(&McpCsvFormat::fields(), &table);
    assert_round_trip(&McpCsvFormat::fields().with_side(1), &table);
}

#[test]
fn enigma_round_trip() {
    assert_round_trip(&EnigmaFormat, &two_way(CLASSES));
}

#[test]
fn onf_round_trip() {
    let text = "\
a:net.minecraft
\tb:World
\t\tc:1_c:time
\t\t<init> (Lnet/minecraft/World;)V
\t\td:2_d:tick (Lnet/minecraft/World;)V
\te:Entity
\t\tf:spawn (Lnet/minecraft/World;)Lnet/minecraft/Entity;
";
    let table = load(&OnfFormat::new(), text, Table::with_intermediate());
    assert_eq!(
        table.lookup_deobf("a.e.f (La/b;)La/e;", Kind::Method).unwrap(),
        Some("net.minecraft.Entity.spawn (Lnet/minecraft/World;)Lnet/minecraft/Entity;")
    );
    assert_round_trip(&OnfFormat::new(), &table);
    // The intermediate names survive a trip through the three-way flat format
    assert_round_trip(&BlObfFormat::new(), &table);
}

#[test]
fn convert_between_dialects() {
    let table = with_packages();
    let srg = SrgFormat::new().store_string(&table).unwrap();
    let converted = load(&SrgFormat::new(), &srg, Table::new());
    let flat = ObfFormat.store_string(&converted).unwrap();
    assert_equivalent(&two_way(&flat), &table);
    // Dialects chosen by name behave like the formats themselves
    let dialect: DialectSpec = "srg".parse().unwrap();
    assert_eq!(dialect.create().store_string(&table).unwrap(), srg);
}

#[test]
fn flat_alternate_separator() {
    let table = two_way("CLASS:a.b:com.example.Foo");
    assert_eq!(table.lookup_deobf("a.b", Kind::Class).unwrap(), Some("com.example.Foo"));
    assert_eq!(table.lookup_obf("com.example.Foo", Kind::Class).unwrap(), Some("a.b"));
}

#[test]
fn srg_split_methods() {
    let table = load(
        &SrgFormat::new(),
        "MD: a/b/c funcname (I)V com/example/Foo realMethod (I)Lcom/example/Bar;",
        Table::new()
    );
    assert_eq!(
        table.lookup_deobf("a.b.c funcname (I)V", Kind::Method).unwrap(),
        Some("com.example.Foo realMethod (I)Lcom/example/Bar;")
    );
}

#[test]
fn comments_are_skipped() {
    let comments = "# A comment\n\n   \n// Another comment\n\t# Indented\n";
    let formats: Vec<Box<dyn MappingsFormat>> = vec![
        Box::new(ObfFormat),
        Box::new(SidedObfFormat::new("S")),
        Box::new(BlObfFormat::new()),
        Box::new(SrgFormat::new()),
        Box::new(OnfFormat::new()),
        Box::new(EnigmaFormat),
    ];
    for format in &formats {
        let mut table = Table::new();
        format.load(comments, &mut table, false).unwrap();
        assert!(table.is_empty(), "Loaded {:?} from comments", table.kinds().collect::<Vec<_>>());
    }
    let mut table = Table::new();
    McpCsvFormat::fields()
        .load(&format!("searge,name,side,desc\n{}", comments), &mut table, false)
        .unwrap();
    assert!(table.is_empty());
}

#[test]
fn errors_report_lines() {
    let mut table = Table::new();
    match ObfFormat.load("CLASS:a=b\n# comment\nCLASS:c", &mut table, false) {
        Err(MappingsError::Format(e)) => {
            assert_eq!(e.line(), 3);
            assert_eq!(e.text(), "CLASS:c");
        },
        other => panic!("Unexpected result {:?}", other)
    }
    match SrgFormat::new().load("CL: a b\nXX: c d\n", &mut Table::new(), false) {
        Err(MappingsError::Format(e)) => assert_eq!(e.line(), 2),
        other => panic!("Unexpected result {:?}", other)
    }
}

#[test]
fn onf_import_cycles() {
    let importer = MemoryImporter::new()
        .with_file("first.onf", "a:net.minecraft\n\tb:World\n>>second.onf\n")
        .with_file("second.onf", ">>first.onf\na:net.minecraft\n\tc:Entity\n>>second.onf\n");
    let mut table = Table::new();
    let report = OnfFormat::with_importer(importer)
        .load_named("first.onf", &mut table, false)
        .unwrap();
    assert!(report.import_failures.is_empty());
    assert_eq!(table.all_obf(Kind::Package).unwrap(), vec!["a"]);
    assert_eq!(table.all_obf(Kind::Class).unwrap(), vec!["a.b", "a.c"]);
}

#[test]
fn onf_imports_from_files() {
    let dir = std::env::temp_dir().join(format!("obf-mappings-{}", std::process::id()));
    fs::create_dir_all(dir.join("extra")).unwrap();
    fs::write(dir.join("main.onf"), "a:net.minecraft\n\tb:World\n>>extra/entity.onf\n").unwrap();
    fs::write(
        dir.join("extra/entity.onf"),
        "a:net.minecraft\n\tc:Entity\n\t\td:move (Lnet/minecraft/World;)V\n>>missing.onf\n"
    ).unwrap();
    let mut table = Table::new();
    let report = OnfFormat::new().load_path_report(&dir.join("main.onf"), &mut table, false);
    fs::remove_dir_all(&dir).unwrap();
    let report = report.unwrap();
    assert_eq!(report.import_failures.len(), 1);
    assert_eq!(report.import_failures[0].file, "missing.onf");
    assert_eq!(
        table.lookup_deobf("a.c.d (La/b;)V", Kind::Method).unwrap(),
        Some("net.minecraft.Entity.move (Lnet/minecraft/World;)V")
    );
}

#[test]
fn descriptor_round_trip() {
    let table = two_way(CLASSES);
    let deobf = "([Lnet/minecraft/World;Lnet/minecraft/Missing;[[I)Lnet/minecraft/Entity;";
    let obf = obfuscate_descriptor(deobf, &table).unwrap();
    assert_eq!(obf, "([La/b;Lnet/minecraft/Missing;[[I)La/e;");
    assert_eq!(deobfuscate_descriptor(&obf, &table).unwrap(), deobf);
    assert!(obfuscate_descriptor("(La/b)V", &table).is_err());
}

#[test]
fn generate_mcp_mappings() {
    let srg = load(&SrgFormat::new().with_side("C"), "\
PK: . net/minecraft/src
CL: a net/minecraft/World
CL: b net/minecraft/Server #S
FD: a/c net/minecraft/World/field_1_c #C
MD: a/d (La;)V net/minecraft/World/func_2_d (Lnet/minecraft/World;)V
", Table::new());
    let mut names = Table::new();
    McpCsvFormat::fields().with_side(0)
        .load("searge,name,side,desc\nfield_1_c,time,0,\n", &mut names, true)
        .unwrap();
    McpCsvFormat::methods().with_side(0)
        .load("searge,name,side,desc\nfunc_2_d,tick,2,\nfunc_9_z,stop,1,\n", &mut names, true)
        .unwrap();
    let table = combine_mcp(&srg, &names);
    assert!(!table.has_obf("b", Kind::Class));
    assert_eq!(
        table.lookup_deobf("a.d (La;)V", Kind::Method).unwrap(),
        Some("net.minecraft.World.tick (Lnet/minecraft/World;)V")
    );
    assert_round_trip(&BlObfFormat::new(), &table);
}
