// ABOUTME: CLI entrypoint for the daybook command
// ABOUTME: Handles error exit codes and command dispatch

use chrono::Utc;
use clap::Parser;
use daybook::{
    api::ApiClient,
    auth::resolve_api_key,
    cli::{Cli, Commands},
    model::{Entry, SearchFilters},
    service::{JournalService, SearchRequest, SearchResponse},
    store::{default_store_path, EntryStore, JsonStore},
    Result,
};
use std::sync::Arc;
use uuid::Uuid;

fn main() {
    if let Err(e) = run() {
        eprintln!("daybook: [E{}] {}", e.exit_code(), e);
        std::process::exit(e.exit_code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let store_path = match &cli.data_file {
        Some(path) => path.clone(),
        None => default_store_path()?,
    };
    let store = Arc::new(JsonStore::open(store_path)?);
    let user = store.default_user();

    match cli.command.clone() {
        Commands::Add {
            content,
            title,
            tags,
            privacy,
        } => {
            let entry = Entry {
                id: Uuid::new_v4(),
                owner_id: user,
                title,
                content,
                tags,
                privacy: privacy.into(),
                shared_with: vec![],
                created_at: Utc::now(),
                media_labels: vec![],
                searchable_text: String::new(),
                content_embedding: None,
                embedding_version: None,
                last_embedding_update: None,
                ai_insights: None,
            };
            let id = entry.id;
            store.insert(entry)?;
            println!("Added entry {}", id);

            // Embedding is best-effort: the entry stands even if this fails
            if let Ok(service) = build_service(&cli, Arc::clone(&store) as Arc<dyn EntryStore>) {
                service.queue_embedding(id);
            } else {
                println!("No API key configured; run `daybook embed` later");
            }
        }

        Commands::Search {
            query,
            scope,
            kind,
            mode,
            limit,
            threshold,
            tags,
            people,
            from,
            to,
        } => {
            let service = build_service(&cli, Arc::clone(&store) as Arc<dyn EntryStore>)?;
            let request = SearchRequest {
                query,
                user,
                scope: scope.into(),
                kind: kind.into(),
                mode: mode.into(),
                limit,
                threshold,
                filters: SearchFilters {
                    tags,
                    people,
                    date_from: from,
                    date_to: to,
                    privacy: None,
                },
            };

            match service.search(&request)? {
                SearchResponse::Results {
                    results,
                    total_results,
                    execution_time_ms,
                } => {
                    println!("{} results in {}ms", total_results, execution_time_ms);
                    for result in results {
                        println!(
                            "  [{:.2}] {} — {}",
                            result.score,
                            result.title.as_deref().unwrap_or("(untitled)"),
                            result.snippet
                        );
                        println!("         {} ({})", result.entry_id, result.match_reason);
                    }
                }
                SearchResponse::Conversational { answer, .. } => println!("{}", answer),
            }
        }

        Commands::Ask { query } => {
            let service = build_service(&cli, Arc::clone(&store) as Arc<dyn EntryStore>)?;
            let answer = service.converse(user, &query, &[])?;
            println!("{}", answer.answer);
            println!();
            println!(
                "confidence {:.2}, grounded in {} entries",
                answer.confidence, answer.entries_used
            );
        }

        Commands::Embed { limit } => {
            let service = build_service(&cli, Arc::clone(&store) as Arc<dyn EntryStore>)?;
            let report = service.process_missing_embeddings(Some(user), limit)?;
            println!(
                "found {}, processed {}, {} errors",
                report.total_found, report.processed, report.errors
            );
        }

        Commands::Status => {
            let status = daybook::processor::status(store.as_ref(), user)?;
            println!("total entries:    {}", status.total_entries);
            println!("with embeddings:  {}", status.with_embeddings);
            println!("needs processing: {}", status.needs_processing);
            println!("coverage:         {:.1}%", status.coverage_percent);
        }
    }

    Ok(())
}

fn build_service(cli: &Cli, store: Arc<dyn EntryStore>) -> Result<JournalService> {
    let api_key = resolve_api_key(cli.api_key.clone())?;
    let mut client = ApiClient::new(api_key, cli.api_base.clone())?;

    if cli.no_throttle {
        client = client.disable_throttle();
    } else if let Some((min, max)) = cli.throttle_ms {
        client = client.with_throttle(min, max);
    }

    Ok(JournalService::new(Arc::new(client), store))
}
