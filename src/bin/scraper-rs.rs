//! Minimal CLI driver: loads a scraper definition, evaluates one named
//! function against an input file, expands chains, and prints the result.
//!
//! Addon discovery, settings.xml parsing, and network fetching are out of
//! scope for the library; this binary supplies the bare
//! minimum of each so the crate is runnable end to end.

use scraper_rs::{Buffers, Settings, evaluate_function, expand_chains, load_function_table};

/// Uses the [`Display`](core::fmt::Display) formatter for an error even when
/// the [`Debug`](core::fmt::Debug) formatter is requested.
struct DisplayError(Box<dyn std::error::Error>);

impl core::fmt::Debug for DisplayError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl<E: Into<Box<dyn std::error::Error>>> From<E> for DisplayError {
    fn from(e: E) -> Self {
        Self(e.into())
    }
}

/// Errors that may occur when parsing arguments.
#[derive(Debug, thiserror::Error)]
enum ArgsError {
    /// Extra unknown junk on the command line.
    #[error("unknown arguments: {}", _0.display())]
    Extra(std::ffi::OsString),
    /// Missing the scraper definition argument.
    #[error("missing <scraper.xml> argument")]
    Definition,
    /// Missing the function name argument.
    #[error("missing <function> argument")]
    Function,
    /// Missing the input file argument.
    #[error("missing <input-file> argument")]
    Input,
    /// Some other parsing error.
    #[error(transparent)]
    Pico(#[from] pico_args::Error),
}

/// Command-line arguments.
struct Args {
    /// Path to the scraper XML definition.
    definition_path: String,
    /// The name of the function to evaluate.
    function: String,
    /// Path to the input document.
    input_path: String,
    /// Optional caller-supplied item identifier (populates `B[2]`).
    item_id: String,
}

impl Args {
    fn new() -> Result<Self, ArgsError> {
        let mut args = pico_args::Arguments::from_env();
        let definition_path = args
            .opt_free_from_str::<String>()?
            .ok_or(ArgsError::Definition)?;
        let function = args.opt_free_from_str::<String>()?.ok_or(ArgsError::Function)?;
        let input_path = args.opt_free_from_str::<String>()?.ok_or(ArgsError::Input)?;
        let item_id = args.opt_free_from_str::<String>()?.unwrap_or_default();

        let rest = args.finish();
        if !rest.is_empty() {
            return Err(ArgsError::Extra(rest.join(std::ffi::OsStr::new(" "))));
        }

        Ok(Self {
            definition_path,
            function,
            input_path,
            item_id,
        })
    }
}

/// Command line usage instructions.
fn usage() {
    let exe = std::env::args().next().unwrap_or_default();
    eprintln!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    eprintln!("Usage: {exe} <scraper.xml> <function> <input-file> [item-id]");
}

/// Strips `\n` and `\r` from the loaded input document before it ever
/// reaches `B[1]`: a CLI-level normalization step that keeps scraper
/// definitions authored against literal newline-stripped input matching
/// byte-for-byte.
fn strip_newlines(input: &str) -> String {
    input.chars().filter(|&c| c != '\n' && c != '\r').collect()
}

fn run() -> Result<(), DisplayError> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let args = match Args::new() {
        Ok(args) => args,
        Err(err) => {
            usage();
            return Err(err)?;
        }
    };

    log::info!("Loading scraper definition from {}", args.definition_path);
    let definition = std::fs::read_to_string(&args.definition_path)?;
    let table = load_function_table(&definition)?;

    let input = std::fs::read_to_string(&args.input_path)?;
    let input = strip_newlines(&input);

    let settings = Settings::new();
    let buffers = Buffers::for_input(input, args.item_id, args.input_path.clone());

    log::info!("Evaluating function {}", args.function);
    let (result, diagnostics) = evaluate_function(&table, &args.function, buffers, &settings)?;

    let (expanded, chain_diagnostics) = expand_chains(&table, &result, &settings, Some(&args.input_path))?;

    let diagnostic_count = diagnostics.len() + chain_diagnostics.len();
    if diagnostic_count > 0 {
        log::info!("{diagnostic_count} diagnostic(s) were logged above");
    }

    print!("{expanded}");
    Ok(())
}

fn main() -> Result<(), DisplayError> {
    run()
}
