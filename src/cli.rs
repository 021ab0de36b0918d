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

use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

use crate::model::QuestionType;

#[derive(Parser, Debug)]
#[command(
    name = "pracsite",
    version,
    about = "Practice question sites with cached video help"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new store for cache and visit history
    Init {
        /// Directory to create the store in
        path: Option<PathBuf>,
    },

    /// List question sets in a catalog
    Sets(SetsArgs),

    /// Browse questions with filters and revealed answers
    Practice(PracticeArgs),

    /// Find short, medium and long videos for a topic
    Videos(VideosArgs),

    /// Manage the video cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Pair question papers with answer keys
    Match(MatchArgs),

    /// Show recently visited practice sites
    History {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Show store stats
    Stats {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Remove every cached video search
    Clear {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct CatalogArgs {
    /// Catalog file (JSON)
    #[arg(long)]
    pub catalog: PathBuf,

    /// Site id when the catalog holds several sites
    #[arg(long)]
    pub site: Option<String>,
}

#[derive(Args, Debug)]
pub struct SetsArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct PracticeArgs {
    #[command(flatten)]
    pub catalog: CatalogArgs,

    /// Question set id, or "all"
    #[arg(long)]
    pub set: Option<String>,

    /// Chapter to include (repeatable)
    #[arg(long)]
    pub chapter: Vec<String>,

    /// Question type to include (repeatable)
    #[arg(long = "type", value_parser = clap::value_parser!(QuestionType))]
    pub kind: Vec<QuestionType>,

    /// Only teacher-verified questions
    #[arg(long)]
    pub verified: bool,

    /// Reveal the answer of a question id (repeatable)
    #[arg(long)]
    pub reveal: Vec<String>,

    /// Reveal every visible answer
    #[arg(long)]
    pub show_all: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct VideosArgs {
    /// Topic to search for
    pub query: String,

    /// Subject or chapter context
    #[arg(long)]
    pub subject: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct MatchArgs {
    /// Question paper PDFs or directories
    #[arg(long = "questions", required = true)]
    pub questions: Vec<PathBuf>,

    /// Answer key PDFs or directories
    #[arg(long = "answers")]
    pub answers: Vec<PathBuf>,

    /// Publish without answer keys
    #[arg(long, conflicts_with = "answers")]
    pub skip_answers: bool,

    /// Confirm every matched pair
    #[arg(long)]
    pub confirm_all: bool,

    /// Accept papers that have no answer key
    #[arg(long)]
    pub acknowledge_missing: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}
