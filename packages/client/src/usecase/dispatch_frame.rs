//! UseCase: 受信フレームの解釈と状態更新
//!
//! サーバーから届いた 1 フレームをパースし、会話 ID を照合したうえで
//! 種別ごとに presence / pause / speed を更新し、呼び出し元へ通知する。
//!
//! - パースに失敗したフレームは "Failed to parse WebSocket message" を通知し、状態は一切変えない
//! - 別の会話 ID を持つフレームは破棄する（会話切り替え中の混線対策）
//! - 未知の種別は黙って無視する（サーバー側の追加に対する前方互換）

use crate::{
    domain::{
        ConversationId, ParticipantName, SenderType, SpeedMultiplier, SyncError, SyncState,
        ThinkerMessage,
    },
    infrastructure::dto::websocket::{InboundFrame, InboundFrameType},
    usecase::observer::SyncObserver,
};
use symposium_shared::time::{now_utc, parse_timestamp};

/// What happened to one inbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// Parsed and handled
    Applied(InboundFrameType),
    /// Parsed but carried nothing actionable (unknown kind, missing fields, user echo)
    Ignored(InboundFrameType),
    /// Tagged with another conversation
    Discarded,
    /// Not a frame
    Malformed,
}

/// 受信フレーム処理のユースケース
pub struct DispatchFrameUseCase<'a> {
    state: &'a mut SyncState,
    observer: &'a mut dyn SyncObserver,
}

impl<'a> DispatchFrameUseCase<'a> {
    /// 新しい DispatchFrameUseCase を作成
    pub fn new(state: &'a mut SyncState, observer: &'a mut dyn SyncObserver) -> Self {
        Self { state, observer }
    }

    /// フレーム処理を実行
    ///
    /// # Arguments
    ///
    /// * `bound` - チャネルが紐づいている会話 ID
    /// * `raw` - 受信したテキスト
    pub fn execute(&mut self, bound: &ConversationId, raw: &str) -> Dispatched {
        let frame = match InboundFrame::parse(raw) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to parse frame as JSON: {}", e);
                self.observer.on_error(&SyncError::MalformedFrame);
                return Dispatched::Malformed;
            }
        };

        if frame.is_foreign_to(bound) {
            tracing::debug!(
                "Discarding {:?} frame for conversation {:?} (bound to {})",
                frame.r#type,
                frame.conversation_id,
                bound
            );
            return Dispatched::Discarded;
        }

        let kind = frame.r#type;
        let applied = match kind {
            InboundFrameType::Message => self.message(bound, frame),
            InboundFrameType::ThinkerTyping => self.typing_started(frame),
            InboundFrameType::ThinkerThinking => self.thinking(frame),
            InboundFrameType::ThinkerStoppedTyping => self.typing_stopped(frame),
            InboundFrameType::Paused => {
                self.state.pause.apply_server_state(true);
                true
            }
            InboundFrameType::Resumed => {
                self.state.pause.apply_server_state(false);
                true
            }
            InboundFrameType::SpeedChanged => match frame.speed_multiplier {
                Some(speed) => {
                    self.state.speed.apply_server_speed(SpeedMultiplier::new(speed));
                    true
                }
                None => false,
            },
            InboundFrameType::Error => {
                let error = SyncError::server(frame.content);
                tracing::warn!("Server reported an error: {}", error);
                self.observer.on_error(&error);
                true
            }
            InboundFrameType::UserJoined | InboundFrameType::UserLeft => {
                tracing::debug!("Peer presence frame {:?} ignored", kind);
                false
            }
            InboundFrameType::Unknown => false,
        };

        if applied {
            Dispatched::Applied(kind)
        } else {
            Dispatched::Ignored(kind)
        }
    }

    fn message(&mut self, bound: &ConversationId, frame: InboundFrame) -> bool {
        let is_thinker = frame
            .sender_type
            .as_deref()
            .and_then(|s| s.parse::<SenderType>().ok())
            == Some(SenderType::Thinker);
        let Some(id) = frame.message_id.filter(|_| is_thinker) else {
            return false;
        };

        let timestamp = frame
            .timestamp
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or_else(now_utc);

        let message = ThinkerMessage {
            id,
            conversation_id: bound.clone(),
            sender_type: SenderType::Thinker,
            sender_name: frame.sender_name,
            content: frame.content.unwrap_or_default(),
            cost: frame.cost,
            timestamp,
        };
        self.observer.on_message(&message);
        true
    }

    fn typing_started(&mut self, frame: InboundFrame) -> bool {
        let Some(name) = participant(frame.sender_name) else {
            return false;
        };
        self.state.presence.start_typing(name.clone());
        self.observer.on_typing_start(&name);
        true
    }

    fn thinking(&mut self, frame: InboundFrame) -> bool {
        let (Some(name), Some(preview)) = (participant(frame.sender_name), frame.content) else {
            return false;
        };
        self.state.presence.update_thinking(name.clone(), preview.clone());
        self.observer.on_thinking(&name, &preview);
        true
    }

    fn typing_stopped(&mut self, frame: InboundFrame) -> bool {
        let Some(name) = participant(frame.sender_name) else {
            return false;
        };
        self.state.presence.stop_typing(&name);
        self.observer.on_typing_stop(&name);
        true
    }
}

fn participant(sender_name: Option<String>) -> Option<ParticipantName> {
    sender_name.and_then(|name| ParticipantName::new(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::observer::{ChannelObserver, SyncEvent};
    use chrono::TimeZone;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn conv() -> ConversationId {
        ConversationId::new("conv-123".to_string()).unwrap()
    }

    fn name(s: &str) -> ParticipantName {
        ParticipantName::new(s.to_string()).unwrap()
    }

    fn dispatch(
        state: &mut SyncState,
        observer: &mut ChannelObserver,
        raw: &str,
    ) -> Dispatched {
        DispatchFrameUseCase::new(state, observer).execute(&conv(), raw)
    }

    fn drain(rx: &mut UnboundedReceiver<SyncEvent>) -> Vec<SyncEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn test_malformed_payload_reports_parse_error_only() {
        // テスト項目: 不正な JSON はパースエラー通知のみで状態を変えない
        // given (前提条件):
        let mut state = SyncState::new();
        let before = state.clone();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        let result = dispatch(&mut state, &mut observer, "not valid json");

        // then (期待する結果):
        assert_eq!(result, Dispatched::Malformed);
        assert_eq!(state, before);
        let events = drain(&mut rx);
        assert_eq!(events, vec![SyncEvent::Error(SyncError::MalformedFrame)]);
        assert_eq!(
            SyncError::MalformedFrame.to_string(),
            "Failed to parse WebSocket message"
        );
    }

    #[test]
    fn test_thinker_message_is_normalized() {
        // テスト項目: thinker の message フレームが正規化されて通知される
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();
        let raw = r#"{"type":"message","conversation_id":"conv-123","sender_type":"thinker",
            "sender_name":"Socrates","content":"Know thyself.","message_id":"m-1",
            "timestamp":"2025-01-15T10:30:00+00:00","cost":0.0123}"#;

        // when (操作):
        let result = dispatch(&mut state, &mut observer, raw);

        // then (期待する結果):
        assert_eq!(result, Dispatched::Applied(InboundFrameType::Message));
        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![SyncEvent::Message(ThinkerMessage {
                id: "m-1".to_string(),
                conversation_id: conv(),
                sender_type: SenderType::Thinker,
                sender_name: Some("Socrates".to_string()),
                content: "Know thyself.".to_string(),
                cost: Some(0.0123),
                timestamp: chrono::Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap(),
            })]
        );
    }

    #[test]
    fn test_long_thinker_name_drives_presence() {
        // テスト項目: 100 文字を超える思考者名でも入力中・思考中・入力終了が反映される
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();
        let long_name = "A".repeat(150);

        // when (操作):
        let typing = dispatch(
            &mut state,
            &mut observer,
            &format!(r#"{{"type":"thinker_typing","sender_name":"{long_name}"}}"#),
        );
        let thinking = dispatch(
            &mut state,
            &mut observer,
            &format!(r#"{{"type":"thinker_thinking","sender_name":"{long_name}","content":"Hmm"}}"#),
        );

        // then (期待する結果):
        assert_eq!(typing, Dispatched::Applied(InboundFrameType::ThinkerTyping));
        assert_eq!(thinking, Dispatched::Applied(InboundFrameType::ThinkerThinking));
        assert!(state.presence.is_typing(&name(&long_name)));
        assert_eq!(
            state.presence.thinking().get(&name(&long_name)).map(String::as_str),
            Some("Hmm")
        );

        // when (操作):
        let stopped = dispatch(
            &mut state,
            &mut observer,
            &format!(r#"{{"type":"thinker_stopped_typing","sender_name":"{long_name}"}}"#),
        );

        // then (期待する結果):
        assert_eq!(
            stopped,
            Dispatched::Applied(InboundFrameType::ThinkerStoppedTyping)
        );
        assert!(state.presence.is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::TypingStarted(name(&long_name)),
                SyncEvent::Thinking {
                    name: name(&long_name),
                    preview: "Hmm".to_string()
                },
                SyncEvent::TypingStopped(name(&long_name)),
            ]
        );
    }

    #[test]
    fn test_message_without_timestamp_defaults_to_now() {
        // テスト項目: timestamp がない場合は現在時刻が入る
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();
        let before = now_utc();

        // when (操作):
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"message","sender_type":"thinker","message_id":"m-2","content":"Hi"}"#,
        );

        // then (期待する結果):
        let after = now_utc();
        match drain(&mut rx).as_slice() {
            [SyncEvent::Message(message)] => {
                assert!(message.timestamp >= before && message.timestamp <= after);
                assert_eq!(message.sender_name, None);
                assert_eq!(message.cost, None);
            }
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn test_user_echo_and_missing_id_are_not_forwarded() {
        // テスト項目: user の message と message_id のない message は通知されない
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        let echo = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"message","conversation_id":"conv-123","sender_type":"user","content":"Hello!"}"#,
        );
        let no_id = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"message","sender_type":"thinker","content":"orphan"}"#,
        );

        // then (期待する結果):
        assert_eq!(echo, Dispatched::Ignored(InboundFrameType::Message));
        assert_eq!(no_id, Dispatched::Ignored(InboundFrameType::Message));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_foreign_conversation_frame_is_discarded() {
        // テスト項目: 別会話のフレームは状態を変えず破棄される
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        let paused = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"paused","conversation_id":"conv-old"}"#,
        );
        let typing = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"thinker_typing","conversation_id":"conv-old","sender_name":"Kant"}"#,
        );

        // then (期待する結果):
        assert_eq!(paused, Dispatched::Discarded);
        assert_eq!(typing, Dispatched::Discarded);
        assert!(!state.pause.is_paused());
        assert!(state.presence.is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_typing_thinking_stopped_sequence() {
        // テスト項目: typing → thinking → stopped で presence が追従し通知が順に出る
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作): typing と thinking
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"thinker_typing","conversation_id":"conv-123","sender_name":"Einstein"}"#,
        );
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"thinker_thinking","conversation_id":"conv-123","sender_name":"Einstein","content":"Gedankenexperiment"}"#,
        );

        // then (期待する結果):
        assert!(state.presence.is_typing(&name("Einstein")));
        assert_eq!(
            state.presence.thinking().get(&name("Einstein")).map(String::as_str),
            Some("Gedankenexperiment")
        );

        // when (操作): stopped
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"thinker_stopped_typing","conversation_id":"conv-123","sender_name":"Einstein"}"#,
        );

        // then (期待する結果):
        assert!(state.presence.is_empty());
        assert!(state.presence.thinking().is_empty());
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::TypingStarted(name("Einstein")),
                SyncEvent::Thinking {
                    name: name("Einstein"),
                    preview: "Gedankenexperiment".to_string()
                },
                SyncEvent::TypingStopped(name("Einstein")),
            ]
        );
    }

    #[test]
    fn test_thinking_without_content_is_ignored() {
        // テスト項目: content のない thinker_thinking はプレビューを作らない
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        let result = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"thinker_thinking","conversation_id":"conv-123","sender_name":"Hume"}"#,
        );

        // then (期待する結果):
        assert_eq!(result, Dispatched::Ignored(InboundFrameType::ThinkerThinking));
        assert!(state.presence.thinking().is_empty());
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn test_paused_then_resumed_last_value_wins() {
        // テスト項目: paused → resumed の順で最後の値が残る
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, _rx) = ChannelObserver::channel();

        // when (操作):
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"paused","conversation_id":"conv-123"}"#,
        );
        assert!(state.pause.is_paused());
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"resumed","conversation_id":"conv-123"}"#,
        );

        // then (期待する結果):
        assert!(!state.pause.is_paused());
    }

    #[test]
    fn test_speed_changed_adopts_value() {
        // テスト項目: speed_changed の値が採用され、値がなければ無視される
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, _rx) = ChannelObserver::channel();

        // when (操作):
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"speed_changed","conversation_id":"conv-123","speed_multiplier":2.0}"#,
        );
        let missing = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"speed_changed","conversation_id":"conv-123"}"#,
        );

        // then (期待する結果):
        assert_eq!(state.speed.current().value(), 2.0);
        assert_eq!(missing, Dispatched::Ignored(InboundFrameType::SpeedChanged));
    }

    #[test]
    fn test_error_frame_surfaces_verbatim_or_unknown() {
        // テスト項目: error フレームの内容がそのまま通知され、なければ "Unknown error"
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"error","conversation_id":null,"content":"Spend limit exceeded"}"#,
        );
        dispatch(&mut state, &mut observer, r#"{"type":"error"}"#);

        // then (期待する結果):
        assert_eq!(
            drain(&mut rx),
            vec![
                SyncEvent::Error(SyncError::Server("Spend limit exceeded".to_string())),
                SyncEvent::Error(SyncError::Server("Unknown error".to_string())),
            ]
        );
        assert!(!state.pause.is_paused());
    }

    #[test]
    fn test_unknown_and_peer_frames_are_ignored() {
        // テスト項目: 未知の種別と user_joined は無視される
        // given (前提条件):
        let mut state = SyncState::new();
        let (mut observer, mut rx) = ChannelObserver::channel();

        // when (操作):
        let unknown = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"reaction","conversation_id":"conv-123"}"#,
        );
        let joined = dispatch(
            &mut state,
            &mut observer,
            r#"{"type":"user_joined","conversation_id":"conv-123"}"#,
        );

        // then (期待する結果):
        assert_eq!(unknown, Dispatched::Ignored(InboundFrameType::Unknown));
        assert_eq!(joined, Dispatched::Ignored(InboundFrameType::UserJoined));
        assert!(drain(&mut rx).is_empty());
    }
}
