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

use crate::types::card_id::CardId;
use crate::types::window_size::WindowSize;

/// The prefix every command from the drawing surface carries.
pub const COMMAND_PREFIX: &str = "cardink";

/// A command received from the drawing surface over the host's event
/// bridge, decoded from its colon-delimited string form exactly once at
/// this boundary. Dispatch over the decoded value is an exhaustive match.
///
/// The `LoadStrokes` and `RestoreWindowSize` variants are the legacy
/// side-agnostic commands; they resolve against the currently active side.
#[derive(Clone, PartialEq, Debug)]
pub enum BridgeCommand {
    SaveStrokes {
        card: CardId,
        document: String,
        window_size: Option<WindowSize>,
    },
    /// Save without updating the captured window geometry.
    SaveStrokesNoResize { card: CardId, document: String },
    LoadFrontStrokes { card: CardId },
    LoadAllStrokes { card: CardId },
    LoadStrokes { card: CardId },
    RestoreFrontWindowSize {
        card: CardId,
        device_pixel_ratio: f64,
        windows_host: bool,
    },
    RestoreAllWindowSize {
        card: CardId,
        device_pixel_ratio: f64,
        windows_host: bool,
    },
    RestoreWindowSize {
        card: CardId,
        device_pixel_ratio: f64,
        windows_host: bool,
    },
    GetCurrentCardId,
}

/// Why a raw command string could not be decoded.
#[derive(Debug, PartialEq)]
pub enum CommandParseError {
    /// The string is not addressed to this bridge at all.
    ForeignPrefix,
    /// The verb after the prefix is not one the bridge knows.
    UnknownCommand(String),
    /// A required field is absent or empty.
    MissingField(&'static str),
}

impl BridgeCommand {
    pub fn parse(raw: &str) -> Result<Self, CommandParseError> {
        let rest = raw
            .strip_prefix(COMMAND_PREFIX)
            .and_then(|r| r.strip_prefix(':'))
            .ok_or(CommandParseError::ForeignPrefix)?;
        let (verb, args) = match rest.split_once(':') {
            Some((verb, args)) => (verb, Some(args)),
            None => (rest, None),
        };
        match verb {
            "save_strokes" => {
                let (card, payload) = card_and_payload(args)?;
                let (document, window_size) = split_trailing_dimensions(payload);
                Ok(BridgeCommand::SaveStrokes {
                    card,
                    document,
                    window_size,
                })
            }
            "save_strokes_no_window" => {
                let (card, payload) = card_and_payload(args)?;
                Ok(BridgeCommand::SaveStrokesNoResize {
                    card,
                    document: payload.to_string(),
                })
            }
            "load_front_strokes" => Ok(BridgeCommand::LoadFrontStrokes {
                card: card_only(args)?,
            }),
            "load_all_strokes" => Ok(BridgeCommand::LoadAllStrokes {
                card: card_only(args)?,
            }),
            "load_strokes" => Ok(BridgeCommand::LoadStrokes {
                card: card_only(args)?,
            }),
            "restore_front_window_size" => {
                let (card, device_pixel_ratio, windows_host) = card_and_system_info(args)?;
                Ok(BridgeCommand::RestoreFrontWindowSize {
                    card,
                    device_pixel_ratio,
                    windows_host,
                })
            }
            "restore_all_window_size" => {
                let (card, device_pixel_ratio, windows_host) = card_and_system_info(args)?;
                Ok(BridgeCommand::RestoreAllWindowSize {
                    card,
                    device_pixel_ratio,
                    windows_host,
                })
            }
            "restore_window_size" => {
                let (card, device_pixel_ratio, windows_host) = card_and_system_info(args)?;
                Ok(BridgeCommand::RestoreWindowSize {
                    card,
                    device_pixel_ratio,
                    windows_host,
                })
            }
            "get_card_id" => Ok(BridgeCommand::GetCurrentCardId),
            other => Err(CommandParseError::UnknownCommand(other.to_string())),
        }
    }
}

fn card_only(args: Option<&str>) -> Result<CardId, CommandParseError> {
    match args {
        Some(card) if !card.is_empty() => Ok(CardId::new(card)),
        _ => Err(CommandParseError::MissingField("card id")),
    }
}

/// Split `<card>:<payload>`. The payload is the document text and may
/// itself contain colons, so only the first colon separates.
fn card_and_payload(args: Option<&str>) -> Result<(CardId, &str), CommandParseError> {
    let args = args.ok_or(CommandParseError::MissingField("card id"))?;
    let (card, payload) = args
        .split_once(':')
        .ok_or(CommandParseError::MissingField("document"))?;
    if card.is_empty() {
        return Err(CommandParseError::MissingField("card id"));
    }
    Ok((CardId::new(card), payload))
}

/// Recognize a trailing `:<width>:<height>` pair on the save payload. The
/// pair counts only when both segments parse as integers; anything else
/// belongs to the document text.
fn split_trailing_dimensions(payload: &str) -> (String, Option<WindowSize>) {
    let mut segments = payload.rsplitn(3, ':');
    let height = segments.next();
    let width = segments.next();
    let document = segments.next();
    if let (Some(height), Some(width), Some(document)) = (height, width, document) {
        if let (Ok(width), Ok(height)) = (width.parse::<u32>(), height.parse::<u32>()) {
            return (document.to_string(), Some(WindowSize::new(width, height)));
        }
    }
    (payload.to_string(), None)
}

/// Split `<card>[:<dpr>:<os>]`. A missing or unparseable system-info
/// suffix degrades to density 1.0 on a non-Windows host rather than
/// failing the command.
fn card_and_system_info(args: Option<&str>) -> Result<(CardId, f64, bool), CommandParseError> {
    let args = args.ok_or(CommandParseError::MissingField("card id"))?;
    let (card, info) = match args.split_once(':') {
        Some((card, info)) => (card, Some(info)),
        None => (args, None),
    };
    if card.is_empty() {
        return Err(CommandParseError::MissingField("card id"));
    }
    let mut device_pixel_ratio = 1.0;
    let mut windows_host = false;
    if let Some(info) = info {
        let mut segments = info.split(':');
        if let (Some(dpr), Some(os)) = (segments.next(), segments.next()) {
            if let Ok(dpr) = dpr.parse::<f64>() {
                device_pixel_ratio = dpr;
                windows_host = os == "win";
            }
        }
    }
    Ok((CardId::new(card), device_pixel_ratio, windows_host))
}
