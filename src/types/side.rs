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

/// Which persisted view of a card a document belongs to.
///
/// `Front` holds the ink drawn while the question was showing. `All` holds
/// the union: front ink plus whatever was drawn once the answer was
/// revealed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Side {
    Front,
    All,
}

impl Side {
    /// The tag used in document file names (`card_<id>_<tag>.json`).
    pub fn tag(self) -> &'static str {
        match self {
            Side::Front => "front",
            Side::All => "all",
        }
    }
}

/// Which view of the card the reviewer is currently looking at.
///
/// Flipped only by the two view-transition events; starts at `Question`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ActiveSide {
    Question,
    Answer,
}

impl ActiveSide {
    /// The storage side that saves and loads target while this view is
    /// active.
    pub fn storage_side(self) -> Side {
        match self {
            ActiveSide::Question => Side::Front,
            ActiveSide::Answer => Side::All,
        }
    }
}
