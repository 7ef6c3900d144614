//! reqsplit CLI - LLM requirement decomposition and scoring
//!
//! Usage:
//!   reqsplit init                     Write a default reqsplit.toml
//!   reqsplit extract-requirements     Spreadsheet L1 column -> data.json
//!   reqsplit decompose                data.json -> decomposed_output.json
//!   reqsplit evaluate                 Score decompositions with the LLM
//!   reqsplit extract-descriptions     Decompositions -> metric records
//!   reqsplit extract-reference        Spreadsheet L2 column -> metric records
//!   reqsplit metrics                  Similarity metrics -> all_scores_1.json
//!   reqsplit sanity                   Score the canned metric cases
//!   reqsplit print <file>             Show a decomposition file

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use reqsplit_agent::{LlmConfig, OpenAiClient, OpenAiEmbedder};
use reqsplit_core::config::CONFIG_FILE_NAME;
use reqsplit_core::{store, PipelineConfig, RowNumber};
use reqsplit_extract::{
    group_reference_blocks, metric_records_from_decompositions, requirements_from_sheet, Sheet,
};
use reqsplit_metrics::{align, sanity_pairs, score_pairs, EmbeddingBertScorer, MetricsReport, Segmenter};
use reqsplit_planning::{decompose_all, evaluate_all, Decomposer, Evaluator, PromptSet, RowFailure};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "reqsplit")]
#[command(author, version, about = "LLM requirement decomposition and scoring")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding reqsplit.toml
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default reqsplit.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Extract original requirements from the spreadsheet L1 column
    ExtractRequirements {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Output file (defaults to paths.requirements)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Group reference descriptions from the spreadsheet L2 column
    ExtractReference {
        #[command(flatten)]
        sheet: SheetArgs,

        /// Output file (defaults to paths.references)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Build metric records from a decomposition file
    ExtractDescriptions {
        /// Decomposition file (defaults to paths.decomposed)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output file (defaults to paths.predictions)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Decompose every requirement with the LLM
    Decompose {
        /// Requirements file (defaults to paths.requirements)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output file (defaults to paths.decomposed)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Only process the first N requirements
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Score decompositions against their original requirements
    Evaluate {
        /// Requirements file (defaults to paths.requirements)
        #[arg(long, value_name = "FILE")]
        requirements: Option<PathBuf>,

        /// Decomposition file (defaults to paths.decomposed)
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,

        /// Output file (defaults to paths.evaluations)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Compute BERTScore, ROUGE-1, BLEU and METEOR
    Metrics {
        /// Prediction records (defaults to paths.predictions)
        #[arg(long, value_name = "FILE")]
        predictions: Option<PathBuf>,

        /// Reference records (defaults to paths.references)
        #[arg(long, value_name = "FILE")]
        references: Option<PathBuf>,

        /// Report file (defaults to paths.scores)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Score the canned sanity cases
    Sanity {
        /// Also write the report to this file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the sub-requirement descriptions of a decomposition file
    Print {
        /// Decomposition file
        file: PathBuf,

        /// Only this row
        #[arg(long)]
        row: Option<RowNumber>,
    },
}

#[derive(clap::Args)]
struct SheetArgs {
    /// Workbook path (defaults to paths.workbook)
    #[arg(long, value_name = "FILE")]
    workbook: Option<PathBuf>,

    /// Worksheet name (defaults to the first sheet)
    #[arg(long)]
    sheet: Option<String>,

    /// Scan rows 2 up to, not including, this row
    #[arg(long)]
    row_end: Option<RowNumber>,
}

#[derive(clap::Args)]
struct BatchArgs {
    /// Requests in flight at once (defaults to the stage's configured concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write dropped rows to this file
    #[arg(long, value_name = "FILE")]
    failures: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if let Commands::Init { path, force } = &cli.command {
        return cmd_init(path, *force);
    }

    let config = PipelineConfig::load_or_default(&cli.config_dir)
        .with_context(|| format!("Failed to load {}", cli.config_dir.join(CONFIG_FILE_NAME).display()))?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::ExtractRequirements { sheet, output } => {
            cmd_extract_requirements(&config, sheet, output).await
        }
        Commands::ExtractReference { sheet, output } => {
            cmd_extract_reference(&config, sheet, output).await
        }
        Commands::ExtractDescriptions { input, output } => {
            cmd_extract_descriptions(&config, input, output).await
        }
        Commands::Decompose {
            input,
            output,
            limit,
            batch,
        } => cmd_decompose(&config, input, output, limit, batch).await,
        Commands::Evaluate {
            requirements,
            input,
            output,
            batch,
        } => cmd_evaluate(&config, requirements, input, output, batch).await,
        Commands::Metrics {
            predictions,
            references,
            output,
        } => cmd_metrics(&config, predictions, references, output).await,
        Commands::Sanity { output } => cmd_sanity(output).await,
        Commands::Print { file, row } => cmd_print(&file, row).await,
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<()> {
    let target = path.join(CONFIG_FILE_NAME);
    if target.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", target.display());
    }

    let written = PipelineConfig::write_default(path).context("Failed to write config")?;
    println!("Wrote {}", written.display());
    Ok(())
}

fn open_sheet(config: &PipelineConfig, args: &SheetArgs) -> Result<Sheet> {
    let workbook = args.workbook.as_ref().unwrap_or(&config.paths.workbook);
    let sheet_name = args.sheet.as_deref().or(config.sheet.sheet_name.as_deref());

    Sheet::open(workbook, sheet_name)
        .with_context(|| format!("Failed to open workbook {}", workbook.display()))
}

async fn cmd_extract_requirements(
    config: &PipelineConfig,
    args: SheetArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let sheet = open_sheet(config, &args)?;
    let row_end = args.row_end.unwrap_or(config.sheet.row_end);

    let requirements = requirements_from_sheet(&sheet, &config.sheet.l1_column, 2..row_end)?;

    let output = output.unwrap_or_else(|| config.paths.requirements.clone());
    store::save_json(&output, &requirements).await?;
    println!("Wrote {} requirements to {}", requirements.len(), output.display());
    Ok(())
}

async fn cmd_extract_reference(
    config: &PipelineConfig,
    args: SheetArgs,
    output: Option<PathBuf>,
) -> Result<()> {
    let sheet = open_sheet(config, &args)?;
    let row_end = args.row_end.unwrap_or(config.sheet.row_end);

    let records = group_reference_blocks(
        &sheet,
        &config.sheet.l1_column,
        &config.sheet.l2_column,
        2..row_end,
    )?;

    let output = output.unwrap_or_else(|| config.paths.references.clone());
    store::save_json(&output, &records).await?;
    println!("Wrote {} reference records to {}", records.len(), output.display());
    Ok(())
}

async fn cmd_extract_descriptions(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.decomposed.clone());
    let results = store::load_decompositions(&input)
        .await
        .with_context(|| format!("Failed to load decompositions from {}", input.display()))?;

    let records = metric_records_from_decompositions(&results);

    let output = output.unwrap_or_else(|| config.paths.predictions.clone());
    store::save_json(&output, &records).await?;
    println!("Wrote {} description records to {}", records.len(), output.display());
    Ok(())
}

fn llm_config() -> Result<LlmConfig> {
    LlmConfig::from_env().context("LLM configuration is incomplete")
}

async fn write_failures(path: Option<PathBuf>, failures: &[RowFailure]) -> Result<()> {
    if let Some(path) = path {
        store::save_json(&path, failures).await?;
        info!("Wrote {} failure records to {}", failures.len(), path.display());
    }
    Ok(())
}

async fn cmd_decompose(
    config: &PipelineConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    limit: Option<usize>,
    batch: BatchArgs,
) -> Result<()> {
    let input = input.unwrap_or_else(|| config.paths.requirements.clone());
    info!("Reading requirements from {}", input.display());

    let requirements = store::load_requirements(&input, limit)
        .await
        .with_context(|| format!("Failed to load requirements from {}", input.display()))?;
    if requirements.is_empty() {
        bail!("No requirements in {}", input.display());
    }

    let client = OpenAiClient::new(llm_config()?)?;

    let decomposer = Decomposer::new(Arc::new(client), Arc::new(PromptSet::standard()))
        .with_rules(config.decomposition.rules.clone())
        .with_format_instruction(config.decomposition.format_instruction.clone());

    let concurrency = batch.concurrency.unwrap_or(config.decomposition.concurrency);
    let outcome = decompose_all(&decomposer, &requirements, concurrency).await;

    let output = output.unwrap_or_else(|| config.paths.decomposed.clone());
    if outcome.results.is_empty() {
        warn!("No requirement was decomposed, not writing {}", output.display());
    } else {
        store::save_json(&output, &outcome.results).await?;
        println!("Wrote {} decompositions to {}", outcome.results.len(), output.display());
    }

    write_failures(batch.failures, &outcome.failures).await?;
    println!("\n{}", outcome);
    Ok(())
}

async fn cmd_evaluate(
    config: &PipelineConfig,
    requirements: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    batch: BatchArgs,
) -> Result<()> {
    let requirements = requirements.unwrap_or_else(|| config.paths.requirements.clone());
    let originals = store::load_requirement_map(&requirements)
        .await
        .with_context(|| format!("Failed to load requirements from {}", requirements.display()))?;

    let input = input.unwrap_or_else(|| config.paths.decomposed.clone());
    let decompositions = store::load_decompositions(&input)
        .await
        .with_context(|| format!("Failed to load decompositions from {}", input.display()))?;
    if decompositions.is_empty() {
        bail!("No decompositions in {}", input.display());
    }

    let client = OpenAiClient::new(llm_config()?)?;

    let evaluator = Evaluator::new(Arc::new(client), Arc::new(PromptSet::standard()));

    let concurrency = batch.concurrency.unwrap_or(config.evaluation.concurrency);
    let outcome = evaluate_all(&evaluator, &originals, &decompositions, concurrency).await;

    let output = output.unwrap_or_else(|| config.paths.evaluations.clone());
    if outcome.results.is_empty() {
        warn!("No decomposition was evaluated, not writing {}", output.display());
    } else {
        store::save_json(&output, &outcome.results).await?;
        println!("Wrote {} evaluations to {}", outcome.results.len(), output.display());
    }

    write_failures(batch.failures, &outcome.failures).await?;
    println!("\n{}", outcome);
    Ok(())
}

fn bert_scorer(segmenter: Arc<Segmenter>) -> Result<EmbeddingBertScorer<OpenAiEmbedder>> {
    let config = llm_config()?;
    info!("Using embedding model {}", config.embedding_model);
    Ok(EmbeddingBertScorer::new(OpenAiEmbedder::new(config)?, segmenter))
}

fn print_report(report: &MetricsReport) {
    println!("\n--- Average scores ---");
    println!("{}", report.average_scores);
}

async fn cmd_metrics(
    config: &PipelineConfig,
    predictions: Option<PathBuf>,
    references: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let predictions = predictions.unwrap_or_else(|| config.paths.predictions.clone());
    let references = references.unwrap_or_else(|| config.paths.references.clone());

    info!("Loading predictions and references");
    let prediction_map = store::load_descriptions(&predictions)
        .await
        .with_context(|| format!("Failed to load predictions from {}", predictions.display()))?;
    let reference_map = store::load_descriptions(&references)
        .await
        .with_context(|| format!("Failed to load references from {}", references.display()))?;

    let pairs = align(&prediction_map, &reference_map);
    info!("{} rows aligned", pairs.len());

    let segmenter = Arc::new(Segmenter::new());
    let scorer = bert_scorer(segmenter.clone())?;
    let report = score_pairs(&pairs, &segmenter, &scorer)
        .await
        .context("Failed to compute metrics")?;

    let output = output.unwrap_or_else(|| config.paths.scores.clone());
    store::save_json(&output, &report).await?;
    println!("Wrote metrics for {} rows to {}", report.per_row_scores.len(), output.display());

    print_report(&report);
    Ok(())
}

async fn cmd_sanity(output: Option<PathBuf>) -> Result<()> {
    let segmenter = Arc::new(Segmenter::new());
    let scorer = bert_scorer(segmenter.clone())?;

    let report = score_pairs(&sanity_pairs(), &segmenter, &scorer)
        .await
        .context("Failed to compute metrics")?;

    for row in &report.per_row_scores {
        println!(
            "{}: bert_f1={:.4} rouge-1={:.4} bleu={:.4} meteor={:.4}",
            row.row, row.bert_f1, row.rouge_1, row.bleu, row.meteor
        );
    }

    if let Some(output) = output {
        store::save_json(&output, &report).await?;
        println!("Wrote {}", output.display());
    }

    print_report(&report);
    Ok(())
}

async fn cmd_print(file: &Path, row: Option<RowNumber>) -> Result<()> {
    let results = store::load_decompositions(file)
        .await
        .with_context(|| format!("Failed to load {}", file.display()))?;

    match row {
        None => {
            for result in &results {
                println!("{}", result.row_number);
                for sub in &result.decomposed_list {
                    println!("{}", sub.description);
                }
            }
        }
        Some(row) => match results.iter().find(|r| r.row_number == row) {
            Some(result) => {
                for sub in &result.decomposed_list {
                    println!("{}", sub.description);
                }
            }
            None => println!("Row {} not found in {}", row, file.display()),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_decompose_flags() {
        let cli = Cli::try_parse_from([
            "reqsplit",
            "decompose",
            "--limit",
            "5",
            "--concurrency",
            "2",
            "--failures",
            "failed.json",
        ])
        .unwrap();

        match cli.command {
            Commands::Decompose { limit, batch, .. } => {
                assert_eq!(limit, Some(5));
                assert_eq!(batch.concurrency, Some(2));
                assert_eq!(batch.failures, Some(PathBuf::from("failed.json")));
            }
            _ => panic!("expected decompose"),
        }
    }

    #[test]
    fn test_print_row() {
        let cli = Cli::try_parse_from(["reqsplit", "-v", "print", "out.json", "--row", "65"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Print { row: Some(65), .. }
        ));
    }
}
