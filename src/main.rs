//! Command-line interface for xmlschema-types

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use xmlschema_types::{
    CompileOptions, CompiledSchema, Compiler, QName, SchemaParticle, SchemaType, TypeSystem,
    TypeSystemDump,
};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "xmlschema-types")]
#[command(author, version, about = "XML Schema type resolution and content-model checking tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile parsed-schema JSON documents into a type system
    Compile {
        /// Parsed-schema JSON files, compiled together
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Do not report UPA violations
        #[arg(long)]
        no_upa: bool,

        /// Keep going when referenced components are missing
        #[arg(long)]
        allow_partial: bool,

        /// Print the JSON dump of the type system
        #[arg(short, long)]
        json: bool,
    },

    /// Show the resolved model of one type
    Inspect {
        /// Parsed-schema JSON files, compiled together
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Type name in Clark notation ({namespace}local)
        #[arg(short = 't', long = "type", value_name = "QNAME")]
        type_name: String,
    },
}

#[cfg(feature = "cli")]
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            files,
            no_upa,
            allow_partial,
            json,
        } => cmd_compile(files, no_upa, allow_partial, json),
        Commands::Inspect { files, type_name } => cmd_inspect(files, type_name),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn cmd_compile(
    files: Vec<PathBuf>,
    no_upa: bool,
    allow_partial: bool,
    json_output: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let options = CompileOptions::default()
        .with_disable_upa_check(no_upa)
        .with_allow_partial_type_system(allow_partial);
    let compiled = Compiler::new(options).compile_files(&files)?;

    if json_output {
        println!("{}", TypeSystemDump::from_compiled(&compiled).to_json()?);
    } else {
        print_diagnostics(&compiled);
        print_summary(compiled.type_system());
    }
    Ok(!compiled.has_errors())
}

#[cfg(feature = "cli")]
fn cmd_inspect(files: Vec<PathBuf>, type_name: String) -> Result<bool, Box<dyn std::error::Error>> {
    let name = QName::from_clark(&type_name)?;
    let compiled = Compiler::new(CompileOptions::permissive()).compile_files(&files)?;
    let types = compiled.type_system();

    let Some(ty) = types.find_type(&name) else {
        eprintln!("Type {} not found", name);
        return Ok(false);
    };
    print_type(types, ty);
    Ok(true)
}

#[cfg(feature = "cli")]
fn print_diagnostics(compiled: &CompiledSchema) {
    for diagnostic in compiled.diagnostics() {
        eprintln!("{}", diagnostic);
    }
}

#[cfg(feature = "cli")]
fn print_summary(types: &TypeSystem) {
    println!("xmlschema-types v{}", xmlschema_types::VERSION);
    println!();
    println!("Statistics:");
    println!("  Global Types: {}", types.global_types().filter(|t| !t.is_builtin()).count());
    println!("  Global Elements: {}", types.elements().count());
    println!("  Global Attributes: {}", types.attributes().count());
    println!("  Resolved Types: {}", types.types().filter(|t| !t.is_builtin()).count());

    println!("\n=== Types ===");
    for ty in types.types().filter(|t| !t.is_builtin()) {
        let base = ty
            .base_type
            .map(|b| types.get(b).label())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} : {} {} ({})",
            ty.label(),
            ty.derivation,
            base,
            ty.content_variety
        );
    }
}

#[cfg(feature = "cli")]
fn print_type(types: &TypeSystem, ty: &SchemaType) {
    println!("Type: {}", ty.label());
    if let Some(base) = ty.base_type {
        println!("  Base: {} by {}", types.get(base).label(), ty.derivation);
    }
    println!("  Content: {}", ty.content_variety);
    if ty.is_abstract {
        println!("  Abstract: yes");
    }

    if let Some(model) = &ty.content_model {
        println!("\n=== Content Model ===");
        println!("  {}", model);
        print_particle(model, 1);
    }

    if !ty.attribute_model.is_empty() || ty.attribute_model.wildcard().is_some() {
        println!("\n=== Attributes ===");
        for attribute in ty.attribute_model.iter() {
            println!(
                "  {} : {} ({})",
                attribute.name,
                types.get(attribute.type_id).label(),
                attribute.use_mode
            );
        }
        if let Some(wildcard) = ty.attribute_model.wildcard() {
            println!("  any {} ({})", wildcard.names, wildcard.process_contents);
        }
    }

    let properties: Vec<_> = ty
        .element_properties
        .iter()
        .chain(&ty.attribute_properties)
        .collect();
    if !properties.is_empty() {
        println!("\n=== Properties ===");
        for property in properties {
            let max = property
                .max_occurs
                .map(|m| m.to_string())
                .unwrap_or_else(|| "unbounded".to_string());
            println!(
                "  {}{} : {} [{}..{}]",
                if property.is_attribute { "@" } else { "" },
                property.name,
                types.get(property.type_id).label(),
                property.min_occurs,
                max
            );
        }
    }
}

#[cfg(feature = "cli")]
fn print_particle(particle: &SchemaParticle, indent: usize) {
    let pad = "  ".repeat(indent);
    let start = particle
        .start_set()
        .map(|s| s.to_string())
        .unwrap_or_default();
    println!(
        "{}{}{} start={} skippable={}",
        pad,
        particle.kind(),
        particle.occurs,
        start,
        particle.is_skippable().unwrap_or(false)
    );
    for child in particle.children() {
        print_particle(child, indent + 1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
