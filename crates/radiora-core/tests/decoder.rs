//! Tests for feedback::decoder

use proptest::prelude::*;
use radiora_core::feedback::recognized_codes;
use radiora_core::{
    decode, decode_lossy, ButtonAction, ButtonEvent, Command, ButtonState, CordlessEvent, DecodeError, Feedback,
    FeedbackTag, LedMap, LocalZoneChange, MapEntry, MasterControlButtonPress, System, SystemMode,
    ZoneMap, ZoneState,
};

#[test]
fn test_decode_every_command_code() {
    let cases = [
        ("!", FeedbackTag::Prompt),
        ("LZC,1,OFF", FeedbackTag::LocalZoneChange),
        ("MBP,1,3,ON", FeedbackTag::MasterControlButtonPress),
        ("RBP,1,3", FeedbackTag::RaiseButtonPress),
        ("RBR,1,3", FeedbackTag::RaiseButtonRelease),
        ("LBP,1,3", FeedbackTag::LowerButtonPress),
        ("LBR,1,3", FeedbackTag::LowerButtonRelease),
        ("CWU,5", FeedbackTag::CordlessWakingUp),
        ("CGS,5", FeedbackTag::CordlessGoingToSleep),
        ("LMP,0101", FeedbackTag::LedMap),
        ("ZMP,11X0", FeedbackTag::ZoneMap),
        ("RSM,1,ON", FeedbackTag::SystemMode),
        ("XYZ,1,2", FeedbackTag::Unknown),
    ];

    for (line, tag) in cases {
        assert_eq!(decode(line).unwrap().tag(), tag, "line {}", line);
    }
}

#[test]
fn test_decode_master_control_button_press() {
    assert_eq!(
        decode("MBP, 2, 14, OFF, S1").unwrap(),
        Feedback::MasterControlButtonPress(MasterControlButtonPress {
            master_control_number: 2,
            button_number: 14,
            state: ButtonState::Off,
            system: Some(System::One),
        })
    );
}

#[test]
fn test_decode_system_mode_keeps_tokens() {
    assert_eq!(
        decode("RSM,2,OFF,S2").unwrap(),
        Feedback::SystemMode(SystemMode {
            system_mode: "2".to_string(),
            event: "OFF".to_string(),
            system: Some(System::Two),
        })
    );
}

#[test]
fn test_zone_change_system_default() {
    assert_eq!(decode("LZC,3,ON").unwrap().system_number(), Some(1));
    assert_eq!(decode("LZC,3,ON,S2").unwrap().system_number(), Some(2));
}

#[test]
fn test_unknown_keeps_raw_line_unchanged() {
    let raw = "VER, Chronos 1.2 ,S1";
    match decode(raw).unwrap() {
        Feedback::Unknown(u) => {
            assert_eq!(u.raw_line, raw);
            assert_eq!(u.parsed_fields, vec!["VER", "Chronos1.2", "S1"]);
        }
        other => panic!("unexpected feedback: {:?}", other),
    }
}

#[test]
fn test_malformed_lines_error_and_lossy_downgrades() {
    let malformed = ["LZC,x,ON", "MBP,1,2,MAYBE", "CWU,4,S9", "ZMP,1?0"];
    for line in malformed {
        let err = decode(line).unwrap_err();
        assert_eq!(err.raw_line(), line);
        match decode_lossy(line) {
            Feedback::Unknown(u) => assert_eq!(u.raw_line, line),
            other => panic!("unexpected feedback: {:?}", other),
        }
    }
    assert!(matches!(
        decode("CWU,4,S9"),
        Err(DecodeError::InvalidSystem { .. })
    ));
}

#[test]
fn test_feedback_and_commands_survive_json() {
    for line in ["LZC,12,CHG,S2", "ZMP,10X1,S1", "LMP,0011", "RSM,1,ON", "VER,1.0"] {
        let feedback = decode(line).unwrap();
        let json = serde_json::to_string(&feedback).unwrap();
        let restored: Feedback = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, feedback, "json {}", json);
        assert_eq!(restored.to_string(), line);
    }

    let command = Command::PhantomButtonPress {
        button_number: 8,
        action: ButtonAction::Toggle,
        fade_time: Some(4),
        delay_switch: false,
    };
    let json = serde_json::to_string(&command).unwrap();
    let restored: Command = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.encode(Some(1)).unwrap(), "BP,8,TOG,4,S1");
}

fn system_strategy() -> impl Strategy<Value = Option<System>> {
    prop_oneof![Just(None), Just(Some(System::One)), Just(Some(System::Two))]
}

fn map_strategy() -> impl Strategy<Value = Vec<MapEntry>> {
    prop::collection::vec(
        prop_oneof![
            Just(MapEntry::On),
            Just(MapEntry::Off),
            Just(MapEntry::Unknown)
        ],
        0..32,
    )
}

fn button_strategy() -> impl Strategy<Value = ButtonEvent> {
    (any::<u32>(), any::<u32>(), system_strategy()).prop_map(|(mc, b, system)| ButtonEvent {
        master_control_number: mc,
        button_number: b,
        system,
    })
}

fn cordless_strategy() -> impl Strategy<Value = CordlessEvent> {
    (any::<u32>(), system_strategy()).prop_map(|(mc, system)| CordlessEvent {
        master_control_number: mc,
        system,
    })
}

fn zone_and_button_strategy() -> impl Strategy<Value = Feedback> {
    let zone_state = prop_oneof![
        Just(ZoneState::On),
        Just(ZoneState::Off),
        Just(ZoneState::Change)
    ];
    let button_state = prop_oneof![Just(ButtonState::On), Just(ButtonState::Off)];

    prop_oneof![
        Just(Feedback::Prompt),
        (any::<u32>(), zone_state, system_strategy()).prop_map(|(zone_number, state, system)| {
            Feedback::LocalZoneChange(LocalZoneChange {
                zone_number,
                state,
                system,
            })
        }),
        (any::<u32>(), any::<u32>(), button_state, system_strategy()).prop_map(
            |(mc, b, state, system)| {
                Feedback::MasterControlButtonPress(MasterControlButtonPress {
                    master_control_number: mc,
                    button_number: b,
                    state,
                    system,
                })
            }
        ),
        button_strategy().prop_map(Feedback::RaiseButtonPress),
        button_strategy().prop_map(Feedback::RaiseButtonRelease),
        button_strategy().prop_map(Feedback::LowerButtonPress),
        button_strategy().prop_map(Feedback::LowerButtonRelease),
    ]
}

fn cordless_and_map_strategy() -> impl Strategy<Value = Feedback> {
    prop_oneof![
        cordless_strategy().prop_map(Feedback::CordlessWakingUp),
        cordless_strategy().prop_map(Feedback::CordlessGoingToSleep),
        map_strategy().prop_map(|led_states| Feedback::LedMap(LedMap { led_states })),
        (map_strategy(), system_strategy()).prop_map(|(zone_states, system)| {
            Feedback::ZoneMap(ZoneMap {
                zone_states,
                system,
            })
        }),
        ("[0-9]{1,2}", "[A-Z]{2,3}", system_strategy()).prop_map(|(mode, event, system)| {
            Feedback::SystemMode(SystemMode {
                system_mode: mode,
                event,
                system,
            })
        }),
    ]
}

fn feedback_strategy() -> impl Strategy<Value = Feedback> {
    prop_oneof![zone_and_button_strategy(), cordless_and_map_strategy()]
}

proptest! {
    #[test]
    fn prop_unrecognized_codes_decode_to_unknown(
        code in "[A-Z]{1,6}",
        rest in "[ -~]{0,40}",
    ) {
        prop_assume!(!recognized_codes().any(|c| c == code));
        let raw = format!("{},{}", code, rest);
        match decode(&raw) {
            Ok(Feedback::Unknown(u)) => prop_assert_eq!(u.raw_line, raw),
            other => prop_assert!(false, "unexpected result {:?}", other),
        }
    }

    #[test]
    fn prop_decode_lossy_never_loses_the_line(raw in "[ -~]{0,60}") {
        let feedback = decode_lossy(&raw);
        if let Feedback::Unknown(u) = feedback {
            prop_assert_eq!(u.raw_line, raw);
        }
    }

    #[test]
    fn prop_feedback_line_decodes_to_itself(feedback in feedback_strategy()) {
        let line = feedback.to_string();
        prop_assert_eq!(decode(&line), Ok(feedback));
    }
}
