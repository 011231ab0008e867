use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clayout::arch::{describe, Architecture};
use clayout::graph::{GraphBuilder, HeaderGraph};
use clayout::resolver::{Resolution, Resolver};
use clayout::string_interner::StringInterner;
use clayout::type_interner::TypeInterner;
use std::fs;

#[derive(ClapParser, Debug)]
struct Args {
    /// Declaration stream in RON form.
    input_file: String,

    /// Target to lay out for; may repeat. All targets when omitted.
    #[arg(short, long)]
    target: Vec<String>,

    /// Also dump each target's predefined identifier table.
    #[arg(long, default_value_t = false)]
    predefined: bool,
}

fn print_resolution(resolution: &Resolution, symbols: &StringInterner) {
    println!(
        "== {} ({:?} endian)",
        resolution.target.name(),
        resolution.endianness
    );

    for binding in &resolution.bindings {
        let layout = &binding.layout;
        println!(
            "{}: size {}, align {}",
            symbols.resolve(binding.name),
            layout.size,
            layout.align
        );

        for field in &layout.fields {
            let name = match field.name {
                Some(sym) => symbols.resolve(sym),
                None => "<anon>",
            };
            match field.bits {
                Some(bits) => println!(
                    "  {} @ {} bits [{}..{}]",
                    name,
                    field.offset,
                    bits.offset,
                    bits.offset + bits.width
                ),
                None => println!("  {} @ {}", name, field.offset),
            }
        }
    }

    for diag in &resolution.diagnostics {
        match diag.name {
            Some(sym) => eprintln!(
                "error in `{}`: {}",
                symbols.resolve(sym),
                diag.error.render(symbols)
            ),
            None => eprintln!("error: {}", diag.error.render(symbols)),
        }
    }
}

fn main() -> Result<()> {
    let Args {
        input_file,
        target,
        predefined,
    } = Args::try_parse()?;

    let targets: Vec<Architecture> = if target.is_empty() {
        Architecture::all().to_vec()
    } else {
        target
            .iter()
            .map(|name| Architecture::from_name(name).map_err(anyhow::Error::new))
            .collect::<Result<_>>()?
    };

    let source = fs::read_to_string(&input_file)
        .with_context(|| format!("reading {}", input_file))?;
    let graph: HeaderGraph =
        ron::from_str(&source).with_context(|| format!("parsing {}", input_file))?;

    let mut symbols = StringInterner::new();
    let mut types = TypeInterner::new();
    let events = GraphBuilder::new(&mut symbols, &mut types).lower(&graph);

    for target in targets {
        if predefined {
            println!("== {} predefined", target.name());
            for (name, value) in describe(target).predefined {
                println!("{} {}", name, value);
            }
        }

        let resolution = Resolver::for_target(target, &types).run(&events);
        print_resolution(&resolution, &symbols);
    }

    Ok(())
}
