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

//! Practice-site content engine: question filtering and answer reveal, a
//! durable video recommendation cache, paper matching and visit history.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod filter;
pub mod history;
pub mod matching;
pub mod model;
pub mod output;
pub mod reveal;
pub mod search;
pub mod session;
pub mod store;
pub mod video_cache;
