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

//! Pairing uploaded question papers with answer keys before publishing.

use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use globset::GlobBuilder;
use globset::GlobMatcher;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfKind {
    Question,
    Answer,
}

impl PdfKind {
    fn as_label(self) -> &'static str {
        match self {
            PdfKind::Question => "question",
            PdfKind::Answer => "answer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedPdf {
    pub id: String,
    pub name: String,
    pub kind: PdfKind,
    pub size: u64,
}

impl UploadedPdf {
    pub fn new(kind: PdfKind, name: &str, size: u64) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_label().as_bytes());
        hasher.update(name.as_bytes());
        let digest = hex::encode(hasher.finalize());
        Self {
            id: format!("{}-{}", kind.as_label(), &digest[..12]),
            name: name.to_string(),
            kind,
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchedPaper {
    pub question: UploadedPdf,
    pub answer: Option<UploadedPdf>,
    pub confidence: Confidence,
    pub confirmed: bool,
}

/// Strategy for proposing question/answer pairs.
pub trait PaperMatcher {
    fn match_papers(&self, questions: &[UploadedPdf], answers: &[UploadedPdf]) -> Vec<MatchedPaper>;
}

/// Pairs files by upload position and grades the pair from file names only.
///
/// Both names mentioning the same exam (`midterm`, `endterm`) is a high
/// confidence match; otherwise equal upload counts make it medium.
#[derive(Debug, Clone)]
pub struct FilenameMatcher {
    pub exam_markers: Vec<String>,
}

impl Default for FilenameMatcher {
    fn default() -> Self {
        Self {
            exam_markers: vec!["midterm".to_string(), "endterm".to_string()],
        }
    }
}

pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

impl PaperMatcher for FilenameMatcher {
    fn match_papers(&self, questions: &[UploadedPdf], answers: &[UploadedPdf]) -> Vec<MatchedPaper> {
        questions
            .iter()
            .enumerate()
            .map(|(idx, question)| {
                let answer = answers.get(idx);
                let confidence = match answer {
                    None => Confidence::None,
                    Some(answer) => {
                        let q = normalize_name(&question.name);
                        let a = normalize_name(&answer.name);
                        if self
                            .exam_markers
                            .iter()
                            .any(|m| q.contains(m.as_str()) && a.contains(m.as_str()))
                        {
                            Confidence::High
                        } else if answers.len() == questions.len() {
                            Confidence::Medium
                        } else {
                            Confidence::None
                        }
                    }
                };
                MatchedPaper {
                    question: question.clone(),
                    answer: answer.cloned(),
                    confidence,
                    confirmed: confidence == Confidence::High,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewSummary {
    pub high: usize,
    pub medium: usize,
    pub none: usize,
    pub without_answers: usize,
    pub unconfirmed: usize,
}

/// The review step: proposed pairs plus manual corrections.
#[derive(Debug, Clone, Serialize)]
pub struct PaperReview {
    pub papers: Vec<MatchedPaper>,
    #[serde(skip)]
    answers: Vec<UploadedPdf>,
}

impl PaperReview {
    pub fn run(
        matcher: &dyn PaperMatcher,
        questions: &[UploadedPdf],
        answers: Vec<UploadedPdf>,
    ) -> Self {
        let papers = matcher.match_papers(questions, &answers);
        Self { papers, answers }
    }

    /// Every uploaded paper with no answer key, confirmed as such.
    pub fn skip_answers(questions: &[UploadedPdf]) -> Self {
        let papers = questions
            .iter()
            .map(|question| MatchedPaper {
                question: question.clone(),
                answer: None,
                confidence: Confidence::None,
                confirmed: true,
            })
            .collect();
        Self {
            papers,
            answers: Vec::new(),
        }
    }

    pub fn confirm(&mut self, question_id: &str) -> Result<()> {
        let paper = self.paper_mut(question_id)?;
        paper.confirmed = true;
        Ok(())
    }

    pub fn confirm_all_matched(&mut self) -> usize {
        let mut confirmed = 0;
        for paper in &mut self.papers {
            if paper.confidence != Confidence::None && !paper.confirmed {
                paper.confirmed = true;
                confirmed += 1;
            }
        }
        confirmed
    }

    /// Manual choice of answer key (or none); always confirmed and high.
    pub fn change_answer_key(&mut self, question_id: &str, answer_id: Option<&str>) -> Result<()> {
        let answer = match answer_id {
            Some(id) => Some(
                self.answers
                    .iter()
                    .find(|a| a.id == id)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("answer key '{id}' not uploaded"))?,
            ),
            None => None,
        };
        let paper = self.paper_mut(question_id)?;
        paper.answer = answer;
        paper.confirmed = true;
        paper.confidence = Confidence::High;
        Ok(())
    }

    pub fn summary(&self) -> ReviewSummary {
        let mut summary = ReviewSummary::default();
        for paper in &self.papers {
            match paper.confidence {
                Confidence::High => summary.high += 1,
                Confidence::Medium => summary.medium += 1,
                Confidence::None => summary.none += 1,
            }
            if paper.answer.is_none() {
                summary.without_answers += 1;
            }
            if !paper.confirmed {
                summary.unconfirmed += 1;
            }
        }
        summary
    }

    /// Papers lacking answer keys block publishing until acknowledged.
    pub fn can_publish(&self, acknowledged_missing: bool) -> bool {
        self.summary().without_answers == 0 || acknowledged_missing
    }

    fn paper_mut(&mut self, question_id: &str) -> Result<&mut MatchedPaper> {
        self.papers
            .iter_mut()
            .find(|p| p.question.id == question_id)
            .ok_or_else(|| anyhow::anyhow!("question paper '{question_id}' not found"))
    }
}

pub fn format_file_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn pdf_glob() -> Result<GlobMatcher> {
    Ok(GlobBuilder::new("*.pdf")
        .case_insensitive(true)
        .literal_separator(false)
        .build()
        .context("build pdf glob")?
        .compile_matcher())
}

/// PDFs under the given files or directories, sorted by path within each
/// directory so that upload order is stable.
pub fn collect_pdfs(paths: &[PathBuf], kind: PdfKind) -> Result<Vec<UploadedPdf>> {
    let glob = pdf_glob()?;
    let mut pdfs = Vec::new();
    for path in paths {
        if path.is_file() {
            push_pdf(&mut pdfs, &glob, path, kind)?;
            continue;
        }
        if !path.exists() {
            anyhow::bail!("path not found: {}", path.display());
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("walk {}", path.display()))?;
            if entry.file_type().is_file() {
                push_pdf(&mut pdfs, &glob, entry.path(), kind)?;
            }
        }
    }
    Ok(pdfs)
}

fn push_pdf(
    pdfs: &mut Vec<UploadedPdf>,
    glob: &GlobMatcher,
    path: &Path,
    kind: PdfKind,
) -> Result<()> {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return Ok(());
    };
    if !glob.is_match(name) {
        return Ok(());
    }
    let size = std::fs::metadata(path)
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    pdfs.push(UploadedPdf::new(kind, name, size));
    Ok(())
}
