//! V2 JSON frame codec.
//!
//! Every message is a JSON array `[join_ref, ref, topic, event, payload]`.

use serde::Deserialize;
use serde_json::Value;

pub(crate) const PHX_JOIN: &str = "phx_join";
pub(crate) const PHX_LEAVE: &str = "phx_leave";
pub(crate) const PHX_REPLY: &str = "phx_reply";
pub(crate) const PHX_ERROR: &str = "phx_error";
pub(crate) const PHX_CLOSE: &str = "phx_close";
pub(crate) const HEARTBEAT: &str = "heartbeat";
pub(crate) const PHOENIX_TOPIC: &str = "phoenix";

/// One Phoenix message
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Ref of the join that the message belongs to
    pub join_ref: Option<String>,
    /// Ref correlating a push with its reply
    pub msg_ref: Option<String>,
    pub topic: String,
    pub event: String,
    pub payload: Value,
}

type WireFrame = (Option<String>, Option<String>, String, String, Value);

impl Frame {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&(
            &self.join_ref,
            &self.msg_ref,
            &self.topic,
            &self.event,
            &self.payload,
        ))
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        let (join_ref, msg_ref, topic, event, payload): WireFrame = serde_json::from_str(text)?;
        Ok(Self {
            join_ref,
            msg_ref,
            topic,
            event,
            payload,
        })
    }

    pub(crate) fn heartbeat(msg_ref: String) -> Self {
        Self {
            join_ref: None,
            msg_ref: Some(msg_ref),
            topic: PHOENIX_TOPIC.to_string(),
            event: HEARTBEAT.to_string(),
            payload: Value::Object(Default::default()),
        }
    }
}

/// Status carried by a `phx_reply`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Ok,
    Error,
    #[serde(other)]
    Other,
}

/// Payload of a `phx_reply`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reply {
    pub status: ReplyStatus,
    #[serde(default)]
    pub response: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_join_frame() {
        // テスト項目: join フレームが V2 の配列形式にエンコードされる
        // given (前提条件):
        let frame = Frame {
            join_ref: Some("1".to_string()),
            msg_ref: Some("1".to_string()),
            topic: "conversation:abc123".to_string(),
            event: PHX_JOIN.to_string(),
            payload: json!({}),
        };

        // when (操作):
        let text = frame.encode().unwrap();

        // then (期待する結果):
        assert_eq!(text, r#"["1","1","conversation:abc123","phx_join",{}]"#);
    }

    #[test]
    fn test_decode_broadcast_with_null_refs() {
        // テスト項目: サーバーからのブロードキャスト（ref が null）がデコードされる
        // given (前提条件):
        let text = r#"[null,null,"conversation:abc123","new_activity",{"text":"hi"}]"#;

        // when (操作):
        let frame = Frame::decode(text).unwrap();

        // then (期待する結果):
        assert_eq!(frame.join_ref, None);
        assert_eq!(frame.msg_ref, None);
        assert_eq!(frame.topic, "conversation:abc123");
        assert_eq!(frame.event, "new_activity");
        assert_eq!(frame.payload, json!({ "text": "hi" }));
    }

    #[test]
    fn test_decode_rejects_object_frames() {
        // テスト項目: V1 のオブジェクト形式はデコードできない
        // given (前提条件):
        let text = r#"{"topic":"phoenix","event":"heartbeat","payload":{},"ref":"1"}"#;

        // when (操作):
        let result = Frame::decode(text);

        // then (期待する結果):
        assert!(result.is_err());
    }

    #[test]
    fn test_heartbeat_frame() {
        // テスト項目: ハートビートは phoenix トピック宛てで join_ref を持たない
        // when (操作):
        let frame = Frame::heartbeat("7".to_string());

        // then (期待する結果):
        assert_eq!(
            frame.encode().unwrap(),
            r#"[null,"7","phoenix","heartbeat",{}]"#
        );
    }

    #[test]
    fn test_reply_statuses() {
        // テスト項目: ok / error / その他のステータスが解釈される
        // given (前提条件):
        let ok = json!({ "status": "ok", "response": { "messages": [] } });
        let error = json!({ "status": "error", "response": { "reason": "unauthorized" } });
        let timeout = json!({ "status": "timeout" });

        // when (操作):
        let ok: Reply = serde_json::from_value(ok).unwrap();
        let error: Reply = serde_json::from_value(error).unwrap();
        let timeout: Reply = serde_json::from_value(timeout).unwrap();

        // then (期待する結果):
        assert_eq!(ok.status, ReplyStatus::Ok);
        assert_eq!(ok.response, json!({ "messages": [] }));
        assert_eq!(error.status, ReplyStatus::Error);
        assert_eq!(error.response, json!({ "reason": "unauthorized" }));
        assert_eq!(timeout.status, ReplyStatus::Other);
        assert_eq!(timeout.response, Value::Null);
    }
}
