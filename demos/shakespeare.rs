//! Trains a small vocabulary on a text corpus, round-trips a sample line
//! and saves the model.
//!
//! ```text
//! cargo run --example shakespeare -- data/shakespeare.txt
//! cargo run --example shakespeare -- --load shakespeare.model
//! ```
//!
//! Set `RUST_LOG=debug` to see every merge.

use std::{env, fs, process::ExitCode};

use minbpe::{GPT2_SPLIT_PATTERN, Tokenizer, TrainerConfig};

const SAMPLE: &str = "To be or not to be, that is the question.";
const VOCAB_SIZE: usize = 256 + 20;

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let tokenizer = match args.as_slice() {
        [flag, model] if flag == "--load" => Tokenizer::load(model)?,
        [] => train("data/shakespeare.txt")?,
        [corpus] => train(corpus)?,
        _ => return Err("usage: shakespeare [<corpus> | --load <model>]".into()),
    };

    let encoded = tokenizer.encode(SAMPLE)?;
    println!("{encoded:?}");

    let decoded = tokenizer.decode(&encoded)?;
    println!("{decoded}");

    tokenizer.save("shakespeare")?;
    Ok(())
}

fn train(corpus: &str) -> Result<Tokenizer, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(corpus)?;
    let config = TrainerConfig {
        show_progress: true,
        ..TrainerConfig::with_vocab_size(VOCAB_SIZE)
    };
    let (tokenizer, report) = Tokenizer::train_with(&text, GPT2_SPLIT_PATTERN, &config)?;
    log::info!(
        "learned {}/{} merges in {:.2?} ({:?})",
        report.learned_merges,
        report.requested_merges,
        report.elapsed,
        report.stop_reason
    );
    Ok(tokenizer)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
