use clayout::arch::Architecture;
use clayout::error::LayoutErrorKind;
use clayout::graph::{GraphBuilder, HeaderGraph};
use clayout::resolver::{Resolution, Resolver};
use clayout::string_interner::StringInterner;
use clayout::type_interner::TypeInterner;
use std::fs;

struct Session {
    symbols: StringInterner,
    types: TypeInterner,
    events: Vec<clayout::graph::Event>,
}

fn load(sample: &str) -> Session {
    let path = format!("tests/header_samples/{}.ron", sample);
    let contents = fs::read_to_string(&path).unwrap();
    let graph: HeaderGraph = ron::from_str(&contents).unwrap();

    let mut symbols = StringInterner::new();
    let mut types = TypeInterner::new();
    let events = GraphBuilder::new(&mut symbols, &mut types).lower(&graph);

    Session {
        symbols,
        types,
        events,
    }
}

fn binding<'a>(
    session: &Session,
    resolution: &'a Resolution,
    name: &str,
) -> &'a clayout::resolver::Binding {
    resolution
        .bindings
        .iter()
        .find(|b| session.symbols.resolve(b.name) == name)
        .unwrap_or_else(|| panic!("no binding named {:?}", name))
}

#[test]
fn packed_region() {
    let session = load("packed_region");

    for target in Architecture::all().iter().copied() {
        let resolution = Resolver::for_target(target, &session.types).run(&session.events);
        assert!(resolution.diagnostics.is_empty());

        // Inside the region every member is byte-aligned.
        let flock = binding(&session, &resolution, "flock");
        let offsets: Vec<u64> = flock.layout.fields.iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 8, 16, 20, 22]);
        assert_eq!(flock.layout.size, 24);
        assert_eq!(flock.layout.align, 1);
    }

    // The declaration after the pop is back to natural alignment.
    let resolution =
        Resolver::for_target(Architecture::Arm64, &session.types).run(&session.events);
    let unpacked = binding(&session, &resolution, "unpacked");
    assert_eq!(unpacked.layout.fields[1].offset, 8);
    assert_eq!(unpacked.layout.size, 16);
    assert_eq!(unpacked.layout.align, 8);

    // Same header on i386, where the 8-byte scalar aligns to 4.
    let resolution =
        Resolver::for_target(Architecture::I686, &session.types).run(&session.events);
    let unpacked = binding(&session, &resolution, "unpacked");
    assert_eq!(unpacked.layout.fields[1].offset, 4);
    assert_eq!(unpacked.layout.size, 12);
    assert_eq!(unpacked.layout.align, 4);
}

#[test]
fn typedef_chain() {
    let session = load("typedef_chain");

    let resolution =
        Resolver::for_target(Architecture::Arm64, &session.types).run(&session.events);
    assert!(resolution.diagnostics.is_empty());
    assert_eq!(resolution.bindings.len(), 5);

    let timespec = binding(&session, &resolution, "timespec");
    let alias = binding(&session, &resolution, "timespec_t");
    assert_eq!(*alias.layout, *timespec.layout);
    assert_eq!(timespec.layout.size, 16);

    // Pointers to complete and forward-declared tags are the same width.
    let ptr = binding(&session, &resolution, "timespec_ptr");
    let task = binding(&session, &resolution, "task_t");
    assert_eq!(ptr.layout.size, 8);
    assert_eq!(task.layout.size, 8);

    let event = binding(&session, &resolution, "event");
    assert_eq!(event.layout.fields[0].offset, 0);
    assert_eq!(event.layout.fields[1].offset, 16);
    assert_eq!(event.layout.size, 24);

    // Narrower target, narrower layout, same declarations.
    let resolution =
        Resolver::for_target(Architecture::Arm32, &session.types).run(&session.events);
    let event = binding(&session, &resolution, "event");
    assert_eq!(event.layout.fields[1].offset, 8);
    assert_eq!(event.layout.size, 12);
    assert_eq!(event.layout.align, 4);
}

#[test]
fn recoverable_errors() {
    let session = load("recoverable_errors");

    let resolution =
        Resolver::for_target(Architecture::X86_64, &session.types).run(&session.events);

    let kinds: Vec<LayoutErrorKind> = resolution
        .diagnostics
        .iter()
        .map(|d| d.error.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            LayoutErrorKind::UnbalancedPackingDirective,
            LayoutErrorKind::IncompleteTypeAsValue,
        ]
    );

    // The failed declaration names itself in the diagnostic.
    let broken = &resolution.diagnostics[1];
    assert_eq!(session.symbols.resolve(broken.name.unwrap()), "broken");
    assert!(broken.error.pos.is_some());

    // Everything after the failures still resolved.
    let survivor = binding(&session, &resolution, "survivor");
    assert_eq!(survivor.layout.fields[1].offset, 4);
    assert_eq!(survivor.layout.size, 4);
    assert_eq!(survivor.layout.align, 4);
}
