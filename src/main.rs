// Copyright 2026 Pracsite Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context as _;
use anyhow::Result;
use clap::Parser;
use log::debug;
use log::warn;
use serde_json::json;

use pracsite::catalog;
use pracsite::catalog::PracticeSite;
use pracsite::cli::CacheCommands;
use pracsite::cli::CatalogArgs;
use pracsite::cli::Cli;
use pracsite::cli::Commands;
use pracsite::cli::MatchArgs;
use pracsite::cli::PracticeArgs;
use pracsite::cli::VideosArgs;
use pracsite::config;
use pracsite::config::Config;
use pracsite::config::Workspace;
use pracsite::filter::SetScope;
use pracsite::history;
use pracsite::matching;
use pracsite::matching::FilenameMatcher;
use pracsite::matching::PaperReview;
use pracsite::matching::PdfKind;
use pracsite::output;
use pracsite::output::JsonResponse;
use pracsite::output::StatsOut;
use pracsite::output::print_json;
use pracsite::search::FunctionClient;
use pracsite::search::VideoSearch;
use pracsite::search::YouTubeSearch;
use pracsite::session::Action;
use pracsite::session::Session;
use pracsite::store::Store;
use pracsite::video_cache;
use pracsite::video_cache::VideoCache;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init { path } => cmd_init(path),
        Commands::Sets(args) => handle_result(cmd_sets(&args.catalog, args.json), args.json),
        Commands::Practice(args) => {
            let json = args.json;
            handle_result(cmd_practice(args), json)
        }
        Commands::Videos(args) => {
            let json = args.json;
            handle_result(cmd_videos(args), json)
        }
        Commands::Cache {
            command: CacheCommands::Clear { json },
        } => handle_result(cmd_cache_clear(json), json),
        Commands::Match(args) => {
            let json = args.json;
            handle_result(cmd_match(args), json)
        }
        Commands::History { json } => handle_result(cmd_history(json), json),
        Commands::Stats { json } => handle_result(cmd_stats(json), json),
    }
}

fn handle_result(result: Result<()>, json: bool) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            if json {
                let resp = JsonResponse::error("error", &format!("{err:#}"));
                print_json(&resp)?;
                Ok(())
            } else {
                Err(err)
            }
        }
    }
}

fn cmd_init(path: Option<PathBuf>) -> Result<()> {
    let root = path.unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&root).with_context(|| format!("create dir {root:?}"))?;

    let config = config::load_config()?;
    let store_path = root.join(&config.store_path);
    Store::init(&store_path)?;

    let config_path = config::config_path()?;
    if !config_path.exists() {
        config::write_config(&config_path, &config)?;
        debug!("wrote default config to {}", config_path.display());
    }

    println!("Initialized pracsite store at {}", store_path.display());
    Ok(())
}

fn load(args: &CatalogArgs) -> Result<(Option<PracticeSite>, catalog::Catalog)> {
    catalog::load_catalog(&args.catalog)?.select(args.site.as_deref())
}

fn cmd_sets(args: &CatalogArgs, json: bool) -> Result<()> {
    let (site, catalog) = load(args)?;

    if json {
        let resp = JsonResponse::ok()
            .with_results(json!({
                "site": site.as_ref().map(|s| json!({
                    "id": s.id,
                    "title": s.title,
                    "subject": s.subject,
                    "status": s.status,
                })),
                "sets": catalog.sets(),
                "chapters": catalog.chapters(),
            }))
            .with_stats(StatsOut {
                total: catalog.questions().len() as i64,
                ..Default::default()
            });
        print_json(&resp)?;
    } else {
        if let Some(site) = &site {
            println!("{} ({})", site.title, site.subject);
        }
        for set in catalog.sets() {
            println!("{:<12} {:<40} {:>4} questions", set.id, set.title, set.question_count);
        }
    }
    Ok(())
}

fn cmd_practice(args: PracticeArgs) -> Result<()> {
    let started = Instant::now();
    let (site, catalog) = load(&args.catalog)?;

    if let Some(id) = args.set.as_deref()
        && id != "all"
        && catalog.set(id).is_none()
    {
        anyhow::bail!("question set '{id}' not found");
    }
    for id in &args.reveal {
        if catalog.question(id).is_none() {
            anyhow::bail!("question '{id}' not found");
        }
    }

    // Flags select, they do not toggle: a repeated value counts once.
    let chapters: BTreeSet<String> = args.chapter.into_iter().collect();
    let kinds: BTreeSet<_> = args.kind.into_iter().collect();
    let reveals: BTreeSet<String> = args.reveal.into_iter().collect();

    let mut actions = vec![Action::SelectSet(SetScope::from_arg(args.set.as_deref()))];
    actions.extend(chapters.into_iter().map(Action::ToggleChapter));
    actions.extend(kinds.into_iter().map(Action::ToggleType));
    if args.verified {
        actions.push(Action::ToggleVerified);
    }
    actions.extend(reveals.into_iter().map(Action::ToggleReveal));
    if args.show_all {
        actions.push(Action::SetShowAll(true));
    }
    let session = Session::new().apply_all(&catalog, actions);
    let view = session.view(&catalog);
    let active_filters = session.filter.active_filter_count();

    let mut warnings = Vec::new();
    if let Some(site) = &site
        && let Err(err) = remember_visit(site)
    {
        warn!("failed to record visit: {err:#}");
        warnings.push(format!("visit not recorded: {err:#}"));
    }

    if args.json {
        let resp = JsonResponse::ok()
            .with_results(output::practice_json(&view, &session.reveal))
            .with_stats(StatsOut {
                took_ms: started.elapsed().as_millis() as i64,
                total: view.len() as i64,
                active_filters: Some(active_filters as i64),
                ..Default::default()
            })
            .with_warnings(warnings);
        print_json(&resp)?;
    } else {
        output::print_practice(&view, &session.reveal, active_filters);
    }
    Ok(())
}

/// Visits are only remembered when a store has been initialized.
fn remember_visit(site: &PracticeSite) -> Result<()> {
    let ctx = match Workspace::discover() {
        Ok(ctx) => ctx,
        Err(err) => {
            debug!("skipping visit history: {err:#}");
            return Ok(());
        }
    };
    let store = Store::open(&ctx.store_path())?;
    history::record_visit(&store, site, &ctx.config.share_base_url, &history::today())?;
    Ok(())
}

fn video_search(config: &Config) -> Result<Box<dyn VideoSearch>> {
    if let Some(endpoint) = &config.search_endpoint {
        let api_key = std::env::var(&config.search_api_key_env).ok();
        return Ok(Box::new(FunctionClient::new(
            endpoint,
            api_key,
            config.request_timeout(),
        )?));
    }
    let api_key = std::env::var(&config.youtube_api_key_env).with_context(|| {
        format!(
            "no video search configured: set search_endpoint in the config or {}",
            config.youtube_api_key_env
        )
    })?;
    Ok(Box::new(YouTubeSearch::new(
        &config.youtube_api_base,
        api_key,
        config.max_search_results,
        config.request_timeout(),
    )?))
}

fn cmd_videos(args: VideosArgs) -> Result<()> {
    let started = Instant::now();
    let ctx = Workspace::discover()?;
    let store = Store::open(&ctx.store_path())?;
    let search = video_search(&ctx.config)?;
    let cache = VideoCache::new(&store, search.as_ref()).ttl_ms(ctx.config.cache_ttl_ms());
    let result = cache.search_videos(&args.query, args.subject.as_deref())?;

    if args.json {
        let resp = JsonResponse::ok()
            .with_results(serde_json::to_value(&result)?)
            .with_stats(StatsOut {
                took_ms: started.elapsed().as_millis() as i64,
                total: result.videos().count() as i64,
                ..Default::default()
            });
        print_json(&resp)?;
    } else {
        output::print_videos(&result);
    }
    Ok(())
}

fn cmd_cache_clear(json: bool) -> Result<()> {
    let ctx = Workspace::discover()?;
    let store = Store::open(&ctx.store_path())?;
    let removed = video_cache::clear_video_cache(&store)?;

    if json {
        let resp = JsonResponse::ok().with_stats(StatsOut {
            removed: Some(removed as i64),
            total: removed as i64,
            ..Default::default()
        });
        print_json(&resp)?;
    } else {
        println!("Cleared {removed} cached video searches");
    }
    Ok(())
}

fn cmd_match(args: MatchArgs) -> Result<()> {
    let questions = matching::collect_pdfs(&args.questions, PdfKind::Question)?;
    if questions.is_empty() {
        anyhow::bail!("no question paper PDFs found");
    }

    let mut review = if args.skip_answers {
        PaperReview::skip_answers(&questions)
    } else {
        let answers = matching::collect_pdfs(&args.answers, PdfKind::Answer)?;
        PaperReview::run(&FilenameMatcher::default(), &questions, answers)
    };
    if args.confirm_all {
        review.confirm_all_matched();
    }
    let can_publish = review.can_publish(args.acknowledge_missing || args.skip_answers);

    if args.json {
        let summary = review.summary();
        let resp = JsonResponse::ok()
            .with_results(json!({
                "papers": review.papers,
                "summary": summary,
                "can_publish": can_publish,
            }))
            .with_stats(StatsOut {
                total: review.papers.len() as i64,
                ..Default::default()
            });
        print_json(&resp)?;
    } else {
        output::print_review(&review, can_publish);
    }
    Ok(())
}

fn cmd_history(json: bool) -> Result<()> {
    let ctx = Workspace::discover()?;
    let store = Store::open(&ctx.store_path())?;
    let entries = history::list(&store)?;

    if json {
        let resp = JsonResponse::ok()
            .with_results(serde_json::to_value(&entries)?)
            .with_stats(StatsOut {
                total: entries.len() as i64,
                ..Default::default()
            });
        print_json(&resp)?;
    } else if entries.is_empty() {
        println!("No practice sites visited yet");
    } else {
        for entry in &entries {
            println!("{}  {}  {}", entry.last_visited, entry.title, entry.link);
        }
    }
    Ok(())
}

fn cmd_stats(json: bool) -> Result<()> {
    let ctx = Workspace::discover()?;
    let store = Store::open(&ctx.store_path())?;
    let stats = store.stats()?;
    let cached = store.count_with_prefix(video_cache::CACHE_KEY_PREFIX)?;

    if json {
        let resp = JsonResponse::ok().with_stats(StatsOut {
            total: stats.entry_count,
            entry_count: Some(stats.entry_count),
            cached_searches: Some(cached),
            db_size_bytes: Some(stats.db_size_bytes),
            ..Default::default()
        });
        print_json(&resp)?;
    } else {
        println!("Entries: {}", stats.entry_count);
        println!("Cached searches: {cached}");
        println!("DB size: {} bytes", stats.db_size_bytes);
        println!("Cache TTL: {} hours", ctx.config.cache_ttl_hours);
    }
    Ok(())
}
