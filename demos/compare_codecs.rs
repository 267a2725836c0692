//! ```text
//! cargo run --example compare_codecs -- [--reference NAME] [--sequential] FILE...
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use plydiff::{ codec_by_name, codecs, Harness, HarnessConfig, Input };

/// Decodes PLY files with every built-in codec and reports the first
/// disagreement. Also prints how long each codec takes per file.
#[derive(Parser, Debug)]
#[command(name = "compare_codecs")]
struct Args {
    /// Codec the others are compared against.
    #[arg(long, default_value = "stream", value_parser = ["stream", "property"])]
    reference: String,

    /// Run codec calls one after another instead of on the rayon pool.
    #[arg(long)]
    sequential: bool,

    /// PLY files to decode.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let Some(reference_codec) = codec_by_name(&args.reference) else {
        eprintln!("unknown codec '{}'", args.reference);
        return ExitCode::from(2);
    };
    let config = HarnessConfig { parallel: !args.sequential, ..HarnessConfig::default() };
    let mut harness = Harness::new(reference_codec).with_config(config);
    for candidate in codecs().into_iter().filter(|c| c.name() != args.reference) {
        harness = harness.with_candidate(candidate);
    }

    for path in &args.files {
        let mut timings = Vec::new();
        for codec in std::iter::once(harness.reference()).chain(harness.candidates()) {
            let start = Instant::now();
            let outcome = codec.parse_file(path);
            timings.push(format!(
                "{} {:?}{}",
                codec.name(),
                start.elapsed(),
                if outcome.is_err() { " (failed)" } else { "" }
            ));
        }
        println!("{}: {}", path.display(), timings.join(", "));
    }

    let inputs: Vec<Input> = args.files.into_iter().map(Input::File).collect();
    match harness.check_equivalence(&inputs) {
        Ok(report) => {
            println!("{} file(s), {} comparison(s): all codecs agree", report.inputs, report.comparisons);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let args = Args::try_parse_from(["compare_codecs", "a.ply", "b.ply"]).unwrap();
        assert_eq!(args.reference, "stream");
        assert!(!args.sequential);
        assert_eq!(args.files, vec![PathBuf::from("a.ply"), PathBuf::from("b.ply")]);
    }

    #[test]
    fn flags() {
        let args = Args::try_parse_from(["compare_codecs", "--reference", "property", "--sequential", "a.ply"]).unwrap();
        assert_eq!(args.reference, "property");
        assert!(args.sequential);
    }

    #[test]
    fn help_is_not_a_file() {
        let err = Args::try_parse_from(["compare_codecs", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn misspelled_flag_is_rejected() {
        let err = Args::try_parse_from(["compare_codecs", "--sequentail", "a.ply"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn unknown_reference_is_rejected() {
        let err = Args::try_parse_from(["compare_codecs", "--reference", "nope", "a.ply"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn files_are_required() {
        let err = Args::try_parse_from(["compare_codecs", "--sequential"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn reference_choices_match_codecs() {
        let names: Vec<&str> = codecs().iter().map(|c| c.name()).collect();
        for name in &names {
            assert!(Args::try_parse_from(["compare_codecs", "--reference", *name, "a.ply"]).is_ok());
        }
        assert_eq!(names.len(), 2);
    }
}
