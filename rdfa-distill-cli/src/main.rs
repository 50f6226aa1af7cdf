use std::fs;
use std::process::ExitCode;

use clap::Parser;
use rdfa_distill::{GraphSelection, HostLanguage, Options, Version};

#[derive(Parser)]
#[command(version, about = "Distill RDFa annotations from a document into Turtle")]
struct Args {
    /// URL or file path of the document to distill.
    #[arg(value_name = "TARGET")]
    target: String,

    /// Base IRI for resolving relative references; defaults to the target
    /// URL. Required when reading from a file.
    #[arg(long)]
    base: Option<String>,

    /// Host language: html4, html5, xhtml1, xhtml5, xml or svg.
    #[arg(long, default_value = "html5")]
    host_language: HostLanguage,

    /// RDFa version: 1.0 or 1.1.
    #[arg(long = "rdfa-version", default_value = "1.1")]
    rdfa_version: Version,

    /// Entail additional statements from the known vocabulary closures.
    #[arg(long)]
    vocab_expansion: bool,

    /// Fail on literals that do not match their declared built-in datatype.
    #[arg(long)]
    validate: bool,

    /// Graph(s) to print: output and/or processor (comma-separated). The
    /// output graph goes to stdout, the processor graph to stderr.
    #[arg(long, default_value = "output")]
    rdfagraph: GraphSelection,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let args = Args::parse();

    let remote = url::Url::parse(&args.target)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"));

    let (content, base) = if let Some(url) = remote {
        let client = reqwest::blocking::Client::new();
        let response = client.get(url.clone()).send()?.error_for_status()?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());

        if content_type.is_some_and(|ct| {
            !ct.starts_with("text/html")
                && !ct.starts_with("application/xhtml+xml")
                && !ct.starts_with("image/svg")
                && !ct.starts_with("application/xml")
        }) {
            eprintln!("Error: unsupported content type.");
            return Ok(ExitCode::FAILURE);
        }

        let base = args.base.clone().unwrap_or_else(|| url.to_string());
        (response.text()?, base)
    } else {
        let content = fs::read_to_string(&args.target)?;
        let base = args
            .base
            .clone()
            .ok_or("--base is required when reading from a file")?;
        (content, base)
    };

    let base_iri = oxiri::Iri::parse(base)?;

    let mut options = Options::new(base_iri.clone());
    options.host_language = args.host_language;
    options.version = args.rdfa_version;
    options.vocab_expansion = args.vocab_expansion;
    options.validate = args.validate;
    options.rdfagraph = args.rdfagraph;

    let selection = options.rdfagraph;
    let distillation = rdfa_distill::distill(&content, options)?;
    let (output_graph, processor_graph) = distillation.into_graphs();

    if selection.processor {
        let serializer = oxttl::TurtleSerializer::new();
        let mut locked_err = std::io::stderr().lock();
        let mut writer = serializer.for_writer(&mut locked_err);
        for triple in processor_graph.iter() {
            writer.serialize_triple(triple)?;
        }
        writer.finish()?;
    }

    if selection.output {
        // serialize with all known prefixes
        let serializer = rdfa_distill::initial_context_prefixes().mappings().try_fold(
            oxttl::TurtleSerializer::new().with_base_iri(base_iri.as_str().to_string())?,
            |serializer, (prefix, value)| serializer.with_prefix(prefix, value),
        )?;

        let mut locked_out = std::io::stdout().lock();
        let mut writer = serializer.for_writer(&mut locked_out);
        for triple in output_graph.iter() {
            writer.serialize_triple(triple)?;
        }
        writer.finish()?;
    }

    Ok(ExitCode::SUCCESS)
}
