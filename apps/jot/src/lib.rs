use std::{
	fs,
	path::{Path, PathBuf},
};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use jot_config::{Config, EmbeddingProviderConfig};
use jot_search::{
	CandidateFilter, DefaultProvider, EmbeddingProvider, Entry, HybridRanker, RankMode,
};

#[derive(Debug, Parser)]
#[command(
	version = jot_cli::VERSION,
	about = jot_cli::ABOUT,
	rename_all = "kebab",
	styles = jot_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON array of entries as exported from the record store.
	#[arg(long, short = 'e', value_name = "FILE")]
	pub entries: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Rank entries against a query and print the hits as JSON.
	Search(SearchArgs),
	/// Fill in missing embeddings and print the updated entries as JSON.
	Embed(EmbedArgs),
}

#[derive(Debug, clap::Args)]
pub struct SearchArgs {
	/// Free text; wrap words in double quotes to require them verbatim.
	#[arg(long, short = 'q', default_value = "")]
	pub query: String,
	#[arg(long, short = 'k', value_name = "N", value_parser = jot_cli::parse_positive)]
	pub top_k: Option<u32>,
	#[arg(long)]
	pub tag: Option<String>,
	#[arg(long)]
	pub user_id: Option<String>,
	#[arg(long, value_name = "RFC3339", value_parser = parse_rfc3339)]
	pub start: Option<OffsetDateTime>,
	#[arg(long, value_name = "RFC3339", value_parser = parse_rfc3339)]
	pub end: Option<OffsetDateTime>,
}

#[derive(Debug, clap::Args)]
pub struct EmbedArgs {
	/// Re-embed entries that already carry a vector.
	#[arg(long)]
	pub force: bool,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput<'a> {
	pub query: String,
	pub mode: RankMode,
	pub top_k: u32,
	pub candidate_count: usize,
	pub filtered_count: usize,
	pub items: Vec<SearchItem<'a>>,
}

#[derive(Debug, Serialize)]
pub struct SearchItem<'a> {
	pub entry: &'a Entry,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub distance: Option<f32>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = jot_config::load(&args.config)?;

	init_tracing(&config);

	let mut entries = load_entries(&args.entries)?;

	match &args.command {
		Command::Search(search_args) => {
			let ranker = HybridRanker::new(config.providers.embedding.clone());
			let output = search(&ranker, &config, &entries, search_args).await?;

			println!("{}", serde_json::to_string_pretty(&output)?);
		},
		Command::Embed(embed_args) => {
			let updated = backfill_embeddings(
				&DefaultProvider,
				&config.providers.embedding,
				&mut entries,
				embed_args.force,
			)
			.await?;

			tracing::info!(updated, total = entries.len(), "Embeddings backfilled.");

			println!("{}", serde_json::to_string_pretty(&entries)?);
		},
	}

	Ok(())
}

pub async fn search<'a>(
	ranker: &HybridRanker,
	config: &Config,
	entries: &'a [Entry],
	args: &SearchArgs,
) -> color_eyre::Result<SearchOutput<'a>> {
	if let (Some(start), Some(end)) = (args.start, args.end)
		&& start > end
	{
		return Err(eyre::eyre!("--start must not be later than --end."));
	}

	let filter = CandidateFilter {
		user_id: args.user_id.clone(),
		tag: args.tag.clone(),
		start: args.start,
		end: args.end,
	};
	let candidates = filter.select(entries);
	let top_k = resolve_top_k(args.top_k, config);
	let outcome = ranker.rank_scored(&candidates, &args.query, top_k as usize).await?;

	tracing::info!(
		mode = ?outcome.mode,
		candidates = candidates.len(),
		returned = outcome.items.len(),
		"Search finished."
	);

	let items = outcome
		.items
		.iter()
		.map(|item| SearchItem { entry: *item.record, distance: item.distance })
		.collect();

	Ok(SearchOutput {
		query: args.query.clone(),
		mode: outcome.mode,
		top_k,
		candidate_count: candidates.len(),
		filtered_count: outcome.filtered,
		items,
	})
}

/// Embeds every entry lacking a vector (or all of them with `force`) in one provider call.
///
/// Entries with blank text are left untouched. Returns how many entries were updated.
pub async fn backfill_embeddings(
	provider: &dyn EmbeddingProvider,
	cfg: &EmbeddingProviderConfig,
	entries: &mut [Entry],
	force: bool,
) -> color_eyre::Result<usize> {
	let targets: Vec<usize> = entries
		.iter()
		.enumerate()
		.filter(|(_, entry)| !entry.text.trim().is_empty() && (force || !entry.has_embedding()))
		.map(|(idx, _)| idx)
		.collect();

	if targets.is_empty() {
		return Ok(0);
	}

	let texts: Vec<String> = targets.iter().map(|&idx| entries[idx].text.clone()).collect();
	let vectors = provider.embed(cfg, &texts).await?;

	if vectors.len() != targets.len() {
		return Err(eyre::eyre!(
			"Provider returned {} embeddings for {} entries.",
			vectors.len(),
			targets.len()
		));
	}

	for (idx, vector) in targets.iter().zip(vectors) {
		entries[*idx].embedding = Some(vector);
	}

	Ok(targets.len())
}

pub fn resolve_top_k(requested: Option<u32>, config: &Config) -> u32 {
	requested.unwrap_or(config.search.default_top_k).clamp(1, config.search.max_top_k)
}

pub fn load_entries(path: &Path) -> color_eyre::Result<Vec<Entry>> {
	let raw = fs::read_to_string(path)
		.map_err(|err| eyre::eyre!("Failed to read entries file at {path:?}: {err}"))?;
	let entries = serde_json::from_str(&raw)
		.map_err(|err| eyre::eyre!("Failed to parse entries file at {path:?}: {err}"))?;

	Ok(entries)
}

fn parse_rfc3339(raw: &str) -> Result<OffsetDateTime, String> {
	OffsetDateTime::parse(raw.trim(), &Rfc3339)
		.map_err(|err| format!("{raw:?} is not RFC 3339: {err}"))
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
