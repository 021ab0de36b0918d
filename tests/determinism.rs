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

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use serde_json::Value;
use serde_json::json;
use tempfile::TempDir;

fn pracsite_cmd(config_root: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("pracsite"));
    cmd.env("PRACSITE_CONFIG", config_root.join("pracsite.toml"));
    cmd
}

fn normalize_json(mut value: Value) -> Value {
    if let Some(stats) = value.get_mut("stats")
        && let Some(obj) = stats.as_object_mut()
    {
        obj.insert("took_ms".to_string(), json!(0));
    }
    value
}

fn run_json(cmd: &mut Command, cwd: &Path) -> Value {
    let output = cmd.current_dir(cwd).output().expect("run command");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).expect("parse json")
}

fn assert_repeatable(args: &[&str], runs: usize, cwd: &Path, config_root: &Path) {
    let mut baseline: Option<Value> = None;
    for _ in 0..runs {
        let mut cmd = pracsite_cmd(config_root);
        cmd.args(args);
        let json = normalize_json(run_json(&mut cmd, cwd));
        if let Some(ref expected) = baseline {
            assert_eq!(&json, expected);
        } else {
            baseline = Some(json);
        }
    }
}

fn catalog_json() -> Value {
    let chapters = ["Laws of Motion", "Electrostatics", "Wave Optics", "Optics"];
    let kinds = ["theory", "numerical", "mcq"];
    let questions: Vec<Value> = (0..30)
        .map(|i| {
            json!({
                "id": format!("q{i}"),
                "setId": format!("{}", i % 3 + 1),
                "number": i / 3 + 1,
                "text": format!("Question {i}"),
                "answer": format!("Answer {i}"),
                "chapter": chapters[i % 4],
                "type": kinds[(i / 2) % 3],
                "isVerified": i % 5 != 0,
            })
        })
        .collect();
    json!({
        "sets": [
            {"id": "1", "title": "Mid-Term 2022"},
            {"id": "2", "title": "Mid-Term 2023"},
            {"id": "3", "title": "End-Term 2023"}
        ],
        "questions": questions,
    })
}

#[test]
fn deterministic_outputs() {
    let config = TempDir::new().expect("config tempdir");
    let temp = TempDir::new().expect("tempdir");
    let root = temp.path();
    fs::write(root.join("catalog.json"), catalog_json().to_string()).expect("write catalog");
    fs::create_dir_all(root.join("papers")).expect("papers dir");
    for name in ["b-midterm.pdf", "a-endterm.pdf", "c-quiz.pdf"] {
        fs::write(root.join("papers").join(name), b"%PDF-1.4\n").expect("write pdf");
    }

    assert_repeatable(
        &[
            "practice",
            "--catalog",
            "catalog.json",
            "--chapter",
            "Electrostatics",
            "--chapter",
            "Optics",
            "--type",
            "mcq",
            "--show-all",
            "--json",
        ],
        20,
        root,
        config.path(),
    );

    assert_repeatable(
        &["sets", "--catalog", "catalog.json", "--json"],
        10,
        root,
        config.path(),
    );

    assert_repeatable(
        &[
            "match",
            "--questions",
            "papers",
            "--answers",
            "papers",
            "--json",
        ],
        10,
        root,
        config.path(),
    );
}
