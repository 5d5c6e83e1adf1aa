// Copyright 2025 Fernando Borretti
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

//! Per-card freehand ink persistence for flashcard review.
//!
//! The host application overlays a drawing canvas on its review screen;
//! this crate owns what happens to the ink: binding stroke documents to
//! card identities, keeping the question-side and answer-side views
//! consistent, restoring captured window geometry, and bulk backup and
//! maintenance of the on-disk store.

pub mod archive;
pub mod bridge;
pub mod cli;
pub mod document;
pub mod error;
pub mod helper;
pub mod reconcile;
pub mod session;
pub mod settings;
pub mod store;
pub mod types;
