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

use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::filter::View;
use crate::matching::PaperReview;
use crate::matching::format_file_size;
use crate::model::QuestionRecord;
use crate::model::VideoSearchResult;
use crate::reveal::RevealState;

#[derive(Debug, Clone, Serialize, Default)]
pub struct StatsOut {
    pub took_ms: i64,
    pub total: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_filters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_searches: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_size_bytes: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorOut {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Serialize, Default)]
pub struct JsonResponse {
    pub ok: bool,
    pub schema_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<StatsOut>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorOut>,
}

impl JsonResponse {
    pub fn ok() -> Self {
        Self {
            ok: true,
            schema_version: "1".to_string(),
            ..Default::default()
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            ok: false,
            schema_version: "1".to_string(),
            error: Some(ErrorOut {
                code: code.to_string(),
                message: message.to_string(),
                details: None,
            }),
            ..Default::default()
        }
    }

    pub fn with_results(mut self, results: Value) -> Self {
        self.results = Some(results);
        self
    }

    pub fn with_stats(mut self, stats: StatsOut) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings = warnings;
        self
    }
}

pub fn print_json(resp: &JsonResponse) -> Result<()> {
    let text = serde_json::to_string_pretty(resp)?;
    println!("{text}");
    Ok(())
}

fn question_json(question: &QuestionRecord, reveal: &RevealState) -> Value {
    let revealed = reveal.is_revealed(&question.id);
    json!({
        "id": question.id,
        "set_id": question.set_id,
        "number": question.number,
        "chapter": question.chapter,
        "type": question.kind,
        "verified": question.is_verified,
        "text": question.text,
        "revealed": revealed,
        "answer": if revealed { Value::String(question.answer.clone()) } else { Value::Null },
    })
}

pub fn practice_json(view: &View<'_>, reveal: &RevealState) -> Value {
    match view {
        View::Grouped(groups) => json!({
            "layout": "grouped",
            "groups": groups
                .iter()
                .map(|g| json!({
                    "set_id": g.set_id,
                    "title": g.title,
                    "count": g.count,
                    "questions": g
                        .questions
                        .iter()
                        .map(|q| question_json(q, reveal))
                        .collect::<Vec<_>>(),
                }))
                .collect::<Vec<_>>(),
        }),
        View::Flat(items) => json!({
            "layout": "flat",
            "questions": items
                .iter()
                .map(|q| question_json(q, reveal))
                .collect::<Vec<_>>(),
        }),
    }
}

pub fn print_practice(view: &View<'_>, reveal: &RevealState, active_filters: usize) {
    if active_filters > 0 {
        println!("{} questions ({active_filters} filters active)", view.len());
    } else {
        println!("{} questions", view.len());
    }
    if view.is_empty() {
        println!("No questions match your filters");
        return;
    }
    match view {
        View::Grouped(groups) => {
            for group in groups {
                println!();
                println!("== {} ({})", group.title.unwrap_or(group.set_id), group.count);
                for question in &group.questions {
                    print_question(question, reveal);
                }
            }
        }
        View::Flat(items) => {
            for question in items {
                print_question(question, reveal);
            }
        }
    }
}

fn print_question(question: &QuestionRecord, reveal: &RevealState) {
    let source = if question.is_verified {
        "verified by teacher"
    } else {
        "system-generated"
    };
    println!(
        "{:>3}. [{} | {} | {}] {}",
        question.number, question.chapter, question.kind, source, question.text
    );
    if reveal.is_revealed(&question.id) {
        for line in question.answer.lines() {
            println!("     > {line}");
        }
    } else {
        println!("     (answer hidden: {})", question.id);
    }
}

pub fn print_videos(result: &VideoSearchResult) {
    if result.is_empty() {
        println!("No videos found");
        return;
    }
    for video in result.videos() {
        println!(
            "{:<6} {} | {} | {} | {}",
            video.duration_category.as_label(),
            video.title,
            video.channel_title,
            video.view_count_display,
            video.duration_display
        );
        println!("       {}", video.url);
    }
}

pub fn print_review(review: &PaperReview, can_publish: bool) {
    for paper in &review.papers {
        let answer = paper
            .answer
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("(no answer key)");
        let state = if paper.confirmed { "confirmed" } else { "needs review" };
        println!(
            "{} ({}) -> {} [{:?}, {state}]",
            paper.question.name,
            format_file_size(paper.question.size),
            answer,
            paper.confidence
        );
    }
    let summary = review.summary();
    println!(
        "{} matched, {} needs review, {} not matched",
        summary.high, summary.medium, summary.none
    );
    if can_publish {
        println!("Ready to publish");
    } else {
        println!(
            "{} papers have no answer key; pass --acknowledge-missing to publish anyway",
            summary.without_answers
        );
    }
}
