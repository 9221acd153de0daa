mod cli;
mod decrypt_cmd;
mod fields_cmd;
mod fill_cmd;
mod logging;
mod shared;

use clap::Parser;
use cli::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(logging::level_for(cli.verbose, cli.quiet)) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    let result = match cli.command {
        cli::Commands::Fill {
            ref source,
            ref cache,
            ref output,
            ref fallback_output,
            ref values,
            ref text,
            ref check,
            ref uncheck,
            flatten,
            decryptor,
            format,
        } => fill_cmd::run(&fill_cmd::FillArgs {
            source,
            cache: cache.as_deref(),
            output: output.as_deref(),
            fallback_output: fallback_output.as_deref(),
            values: values.as_deref(),
            text,
            check,
            uncheck,
            flatten,
            decryptor,
            format,
        }),
        cli::Commands::Fields {
            ref file,
            format,
            limit,
        } => fields_cmd::run(file, format, limit),
        cli::Commands::Decrypt {
            ref source,
            ref cache,
            decryptor,
        } => decrypt_cmd::run(source, cache.as_deref(), decryptor),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
