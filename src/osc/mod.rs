//! OSC control surface: address routing, argument validation, and the UDP
//! receive/send tasks.
//!
//! Type and range validation happens here, synchronously, before a command
//! ever reaches the queue. Checks that need engine state (does that scene
//! exist?) are deferred to the render loop.

pub mod receiver;
pub mod sender;

use std::path::Path;

use rosc::{OscMessage, OscType};

use crate::engine::{Command, SegmentSelector};
use crate::error::EngineError;
use crate::model::{parse_scene_payload, Color};

/// Address the output blob is published under.
pub const FRAME_ADDRESS: &str = "/light/serial";

fn as_int(arg: &OscType) -> Option<i64> {
    match arg {
        OscType::Int(v) => Some(i64::from(*v)),
        OscType::Long(v) => Some(*v),
        OscType::Float(v) => Some(*v as i64),
        OscType::Double(v) => Some(*v as i64),
        _ => None,
    }
}

fn as_float(arg: &OscType) -> Option<f64> {
    match arg {
        OscType::Float(v) => Some(f64::from(*v)),
        OscType::Double(v) => Some(*v),
        OscType::Int(v) => Some(f64::from(*v)),
        OscType::Long(v) => Some(*v as f64),
        _ => None,
    }
}

fn as_str(arg: &OscType) -> Option<&str> {
    match arg {
        OscType::String(s) => Some(s),
        _ => None,
    }
}

fn int_arg(msg: &OscMessage, index: usize) -> Result<i64, EngineError> {
    msg.args.get(index).and_then(as_int).ok_or_else(|| {
        EngineError::invalid(format!("{}: argument {index} must be an integer", msg.addr))
    })
}

fn channel_arg(msg: &OscMessage, index: usize) -> Result<u8, EngineError> {
    Ok(int_arg(msg, index)?.clamp(0, 255) as u8)
}

/// Translate one inbound OSC message into a validated [`Command`].
///
/// Scene payloads are parsed and validated against `strip_len` here so a bad
/// payload never occupies a queue slot. Clampable values (speed, brightness)
/// clamp instead of rejecting; a negative dissolve time is rejected.
pub fn translate(msg: &OscMessage, strip_len: u32) -> Result<Command, EngineError> {
    match msg.addr.as_str() {
        "/load_json" => {
            let payload = msg
                .args
                .first()
                .and_then(as_str)
                .ok_or_else(|| EngineError::invalid("/load_json: expected a string argument"))?;
            let json = resolve_payload(payload)?;
            let scenes = parse_scene_payload(&json, strip_len)?;
            Ok(Command::LoadScene(scenes))
        }
        "/change_scene" => {
            let id = int_arg(msg, 0)?;
            let id = u32::try_from(id)
                .map_err(|_| EngineError::invalid(format!("/change_scene: bad scene id {id}")))?;
            Ok(Command::ChangeScene(id))
        }
        "/change_palette" => {
            let slot = msg
                .args
                .first()
                .and_then(as_str)
                .ok_or_else(|| EngineError::invalid("/change_palette: expected a slot string"))?;
            let palette_id = msg.args.get(1).and_then(as_str).ok_or_else(|| {
                EngineError::invalid("/change_palette: expected a palette id string")
            })?;
            Ok(Command::ChangePalette {
                slot: slot.to_owned(),
                palette_id: palette_id.to_owned(),
            })
        }
        "/change_effect" => {
            let segment = match msg.args.first() {
                Some(arg) => {
                    if let Some(s) = as_str(arg) {
                        if s.eq_ignore_ascii_case("all") {
                            SegmentSelector::All
                        } else {
                            return Err(EngineError::invalid(format!(
                                "/change_effect: bad segment selector {s:?}"
                            )));
                        }
                    } else if let Some(id) = as_int(arg) {
                        let id = u32::try_from(id).map_err(|_| {
                            EngineError::invalid(format!(
                                "/change_effect: bad segment id {id}"
                            ))
                        })?;
                        SegmentSelector::Id(id)
                    } else {
                        return Err(EngineError::invalid(
                            "/change_effect: segment selector must be an int or \"all\"",
                        ));
                    }
                }
                None => {
                    return Err(EngineError::invalid(
                        "/change_effect: expected segment selector and effect id",
                    ))
                }
            };
            let effect = int_arg(msg, 1)?;
            let effect_id = u32::try_from(effect).map_err(|_| {
                EngineError::invalid(format!("/change_effect: bad effect id {effect}"))
            })?;
            Ok(Command::ChangeEffect {
                segment,
                effect_id,
            })
        }
        "/set_dissolve_time" => {
            let seconds = msg.args.first().and_then(as_float).ok_or_else(|| {
                EngineError::invalid("/set_dissolve_time: expected a number of seconds")
            })?;
            if !seconds.is_finite() || seconds < 0.0 {
                return Err(EngineError::invalid(format!(
                    "/set_dissolve_time: {seconds} is not a valid duration"
                )));
            }
            Ok(Command::SetDissolveTime(seconds))
        }
        "/set_speed_percent" => {
            let percent = int_arg(msg, 0)?.clamp(0, 200) as u16;
            Ok(Command::SetSpeedPercent(percent))
        }
        "/master_brightness" => {
            let level = channel_arg(msg, 0)?;
            Ok(Command::SetMasterBrightness(level))
        }
        addr => {
            // Wildcard form: /palette/{palette_id}/{index} with r, g, b args.
            if let Some(rest) = addr.strip_prefix("/palette/") {
                let mut parts = rest.splitn(2, '/');
                let palette_id = parts.next().unwrap_or_default();
                let index = parts
                    .next()
                    .and_then(|s| s.parse::<usize>().ok())
                    .ok_or_else(|| {
                        EngineError::invalid(format!("{addr}: missing or bad color index"))
                    })?;
                if palette_id.is_empty() {
                    return Err(EngineError::invalid(format!("{addr}: missing palette id")));
                }
                let color = Color::rgb(
                    channel_arg(msg, 0)?,
                    channel_arg(msg, 1)?,
                    channel_arg(msg, 2)?,
                );
                return Ok(Command::SetPaletteColor {
                    palette_id: palette_id.to_owned(),
                    index,
                    color,
                });
            }
            Err(EngineError::invalid(format!("unknown OSC address {addr}")))
        }
    }
}

/// A `/load_json` argument is either the JSON text itself or the path of a
/// readable `.json` file.
fn resolve_payload(arg: &str) -> Result<String, EngineError> {
    let trimmed = arg.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(arg.to_owned());
    }
    let path = Path::new(arg);
    if path.extension().is_some_and(|e| e == "json") {
        return std::fs::read_to_string(path).map_err(|e| {
            EngineError::invalid(format!("/load_json: cannot read {arg}: {e}"))
        });
    }
    Err(EngineError::invalid(
        "/load_json: argument is neither JSON nor a .json file path",
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_owned(),
            args,
        }
    }

    #[test]
    fn change_scene_parses_int_id() {
        let cmd = translate(&msg("/change_scene", vec![OscType::Int(3)]), 64).unwrap();
        match cmd {
            Command::ChangeScene(3) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn change_scene_rejects_negative_id() {
        assert!(translate(&msg("/change_scene", vec![OscType::Int(-1)]), 64).is_err());
    }

    #[test]
    fn change_scene_rejects_missing_arg() {
        assert!(translate(&msg("/change_scene", vec![]), 64).is_err());
    }

    #[test]
    fn speed_clamps_instead_of_rejecting() {
        let cmd = translate(&msg("/set_speed_percent", vec![OscType::Int(900)]), 64).unwrap();
        match cmd {
            Command::SetSpeedPercent(200) => {}
            other => panic!("unexpected {other:?}"),
        }
        let cmd = translate(&msg("/set_speed_percent", vec![OscType::Int(-5)]), 64).unwrap();
        match cmd {
            Command::SetSpeedPercent(0) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn brightness_clamps_to_byte_range() {
        let cmd = translate(&msg("/master_brightness", vec![OscType::Int(300)]), 64).unwrap();
        match cmd {
            Command::SetMasterBrightness(255) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dissolve_accepts_float_and_int() {
        let cmd = translate(&msg("/set_dissolve_time", vec![OscType::Float(1.5)]), 64).unwrap();
        match cmd {
            Command::SetDissolveTime(s) => assert!((s - 1.5).abs() < 1e-6),
            other => panic!("unexpected {other:?}"),
        }
        assert!(translate(&msg("/set_dissolve_time", vec![OscType::Int(2)]), 64).is_ok());
    }

    #[test]
    fn dissolve_rejects_negative() {
        assert!(translate(&msg("/set_dissolve_time", vec![OscType::Float(-0.1)]), 64).is_err());
    }

    #[test]
    fn change_effect_accepts_all_selector() {
        let cmd = translate(
            &msg(
                "/change_effect",
                vec![OscType::String("all".to_owned()), OscType::Int(2)],
            ),
            64,
        )
        .unwrap();
        match cmd {
            Command::ChangeEffect {
                segment: SegmentSelector::All,
                effect_id: 2,
            } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn change_effect_accepts_segment_id() {
        let cmd = translate(
            &msg("/change_effect", vec![OscType::Int(4), OscType::Int(7)]),
            64,
        )
        .unwrap();
        match cmd {
            Command::ChangeEffect {
                segment: SegmentSelector::Id(4),
                effect_id: 7,
            } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn change_effect_rejects_bad_selector() {
        let m = msg(
            "/change_effect",
            vec![OscType::String("front".to_owned()), OscType::Int(1)],
        );
        assert!(translate(&m, 64).is_err());
    }

    #[test]
    fn palette_wildcard_builds_color_command() {
        let cmd = translate(
            &msg(
                "/palette/warm/2",
                vec![OscType::Int(255), OscType::Int(128), OscType::Int(0)],
            ),
            64,
        )
        .unwrap();
        match cmd {
            Command::SetPaletteColor {
                palette_id,
                index: 2,
                color,
            } => {
                assert_eq!(palette_id, "warm");
                assert_eq!(color, Color::rgb(255, 128, 0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn palette_wildcard_clamps_channels() {
        let cmd = translate(
            &msg(
                "/palette/warm/0",
                vec![OscType::Int(999), OscType::Int(-4), OscType::Int(7)],
            ),
            64,
        )
        .unwrap();
        match cmd {
            Command::SetPaletteColor { color, .. } => {
                assert_eq!(color, Color::rgb(255, 0, 7));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn palette_wildcard_rejects_bad_index() {
        let m = msg("/palette/warm/two", vec![OscType::Int(1), OscType::Int(1), OscType::Int(1)]);
        assert!(translate(&m, 64).is_err());
    }

    #[test]
    fn unknown_address_rejected() {
        assert!(translate(&msg("/nope", vec![]), 64).is_err());
    }

    #[test]
    fn load_json_inline_payload_parses_scene() {
        let json = r#"{
            "id": 1,
            "segments": [{ "id": 1, "start": 0, "length": 4, "effect": 1 }],
            "effects": [{ "id": 1, "kind": "solid", "palette": "A" }],
            "palettes": [{ "id": "p", "colors": [[255, 0, 0]] }],
            "bindings": { "A": "p" }
        }"#;
        let cmd = translate(
            &msg("/load_json", vec![OscType::String(json.to_owned())]),
            16,
        )
        .unwrap();
        match cmd {
            Command::LoadScene(scenes) => {
                assert_eq!(scenes.len(), 1);
                assert_eq!(scenes[0].id, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn load_json_invalid_payload_rejected_before_enqueue() {
        let json = r#"{
            "id": 1,
            "segments": [{ "id": 1, "start": 0, "length": 99, "effect": 1 }],
            "effects": [{ "id": 1, "kind": "solid", "palette": "A" }],
            "palettes": [{ "id": "p", "colors": [[255, 0, 0]] }],
            "bindings": { "A": "p" }
        }"#;
        let m = msg("/load_json", vec![OscType::String(json.to_owned())]);
        assert!(translate(&m, 16).is_err());
    }

    #[test]
    fn load_json_rejects_non_json_non_path() {
        let m = msg("/load_json", vec![OscType::String("hello".to_owned())]);
        assert!(translate(&m, 16).is_err());
    }
}
