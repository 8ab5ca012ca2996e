use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod config;
mod eid;
mod index;
mod llm;
mod query;
mod records;
#[cfg(test)]
mod tests;
mod web;

use app::{AppBackend, AppFactory, RelevantListRequest, SummaryRequest, TagRequest};
use query::ItemFilter;
use records::{ItemUpdate, NewItem};

/// Splits a comma separated tag list. Tags are matched exactly by the
/// index, so their case is kept.
pub fn parse_tags(tags: String) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
        .collect::<Vec<_>>()
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::Args::parse();

    // the daemon always serves the hosted services, even with KPIN_ADDR set
    let backend = AppFactory::create_backend;

    match args.command {
        cli::Command::Daemon {} => {
            let config = AppFactory::create_config()?;
            let service: Arc<dyn AppBackend> = Arc::new(AppFactory::create_service(&config)?);
            web::start_daemon(service, &config)
        }

        cli::Command::Lists {} => print_json(&backend()?.list_all_lists()?),

        cli::Command::CreateList { name } => print_json(&backend()?.create_list(&name)?),

        cli::Command::Items {
            list,
            tag,
            platform,
        } => {
            let filter = ItemFilter {
                list_id: list,
                tag,
                platform,
            };
            let items = backend()?.list_items(filter)?;

            if items.is_empty() {
                log::info!("no items found");
            }

            print_json(&items)
        }

        cli::Command::Save {
            url,
            title,
            list,
            note,
            tags,
            image_url,
        } => {
            let item = backend()?.save_item(NewItem {
                url: Some(url),
                title: Some(title),
                list_id: Some(list),
                tags: tags.map(parse_tags),
                note,
                image_url,
            })?;

            print_json(&item)
        }

        cli::Command::Update {
            id,
            url,
            title,
            note,
            tags,
            image_url,
            list,
        } => {
            let update = ItemUpdate {
                title,
                url,
                note,
                tags: tags.map(parse_tags),
                image_url,
                list_id: list,
                ..Default::default()
            };

            if update.is_empty() {
                println!("This update request does nothing");
                return Ok(());
            }

            backend()?.update_item(&id, update)?;
            println!("Item updated successfully");
            Ok(())
        }

        cli::Command::Delete { id } => {
            backend()?.delete_item(&id)?;
            println!("Item deleted successfully");
            Ok(())
        }

        cli::Command::SuggestTags {
            url,
            title,
            content,
            existing_tags,
        } => {
            let tags = backend()?.suggest_tags(TagRequest {
                url,
                title,
                content,
                existing_tags: existing_tags.map(parse_tags).unwrap_or_default(),
            })?;

            print_json(&tags)
        }

        cli::Command::Summarize {
            url,
            title,
            content,
        } => {
            let summary = backend()?.generate_summary(SummaryRequest {
                url,
                title,
                content,
            })?;

            println!("{summary}");
            Ok(())
        }

        cli::Command::RelevantList { url, title } => {
            print_json(&backend()?.get_relevant_list(RelevantListRequest { url, title })?)
        }
    }
}
