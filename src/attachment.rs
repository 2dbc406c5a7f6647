//! Attachment records and the depth-bounded walk that finds them.

use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use crate::config::MAX_WALK_DEPTH;
use crate::tree::Node;

/// `_type._name` of an attachment node
pub const ATTACHMENT_TYPE: &str = "ActionTestAttachment";

/// An `ActionTestAttachment` node from the dump
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    /// Display name (`name._value`), if present
    pub name: Option<String>,

    /// Content type (`uniformTypeIdentifier._value`), empty if absent
    pub uniform_type_identifier: String,

    /// Payload reference (`payloadRef.id._value`), empty if absent
    pub payload_id: String,
}

impl AttachmentRecord {
    /// Read a record from a node whose type tag is `ActionTestAttachment`.
    /// Returns `None` for any other node.
    pub fn from_node(node: &Node) -> Option<Self> {
        let type_name = node.path(&["_type", "_name"]).and_then(Node::as_str)?;
        if type_name != ATTACHMENT_TYPE {
            return None;
        }

        let value_at = |keys: &[&str]| node.path(keys).and_then(Node::as_str).map(str::to_string);

        Some(Self {
            name: value_at(&["name", "_value"]),
            uniform_type_identifier: value_at(&["uniformTypeIdentifier", "_value"])
                .unwrap_or_default(),
            payload_id: value_at(&["payloadRef", "id", "_value"]).unwrap_or_default(),
        })
    }

    /// Substring match, so `public.png` and `png` both qualify
    pub fn is_png(&self) -> bool {
        self.uniform_type_identifier.contains("png")
    }

    /// Whether this record should be fetched and written
    pub fn is_extractable(&self) -> bool {
        !self.payload_id.is_empty() && self.is_png()
    }

    /// Base file name: the display name, or `screenshot_<count>` when absent.
    /// Path separators are replaced so the file stays in the output directory.
    pub fn file_stem(&self, count: usize) -> String {
        match &self.name {
            Some(name) => name.replace(['/', '\\'], "_"),
            None => format!("screenshot_{}", count),
        }
    }
}

/// Walk `node` depth-first and hand every attachment record to `visit`, in
/// document order.
///
/// Nodes deeper than [`MAX_WALK_DEPTH`] are not inspected. The children of
/// a matched node are still walked. The first error from `visit` stops the
/// walk.
pub fn find_attachments<F, E>(node: &Node, depth: usize, visit: &mut F) -> Result<(), E>
where
    F: FnMut(AttachmentRecord) -> Result<(), E>,
{
    if depth > MAX_WALK_DEPTH || !node.is_container() {
        return Ok(());
    }

    if let Some(record) = AttachmentRecord::from_node(node) {
        visit(record)?;
    }

    for child in node.children() {
        find_attachments(child, depth + 1, visit)?;
    }
    Ok(())
}

/// Collect every attachment record reachable from the root
pub fn collect_attachments(root: &Node) -> Vec<AttachmentRecord> {
    let mut records = Vec::new();
    let Ok(()) = find_attachments(root, 0, &mut |record: AttachmentRecord| {
        records.push(record);
        Ok::<(), Infallible>(())
    });
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn attachment(name: Option<&str>, uti: &str, id: &str) -> Value {
        let mut node = json!({
            "_type": {"_name": "ActionTestAttachment"},
            "uniformTypeIdentifier": {"_value": uti},
            "payloadRef": {"id": {"_value": id}},
        });
        if let Some(name) = name {
            node["name"] = json!({"_value": name});
        }
        node
    }

    fn nested(depth: usize, leaf: Value) -> Node {
        let mut value = leaf;
        for _ in 0..depth {
            value = json!({"child": value});
        }
        Node::from(value)
    }

    #[test]
    fn test_from_node_reads_fields() {
        let node = Node::from(attachment(Some("login"), "public.png", "REF1"));
        assert_eq!(
            AttachmentRecord::from_node(&node),
            Some(AttachmentRecord {
                name: Some("login".to_string()),
                uniform_type_identifier: "public.png".to_string(),
                payload_id: "REF1".to_string(),
            })
        );
    }

    #[test]
    fn test_from_node_ignores_other_types() {
        let node = Node::from(json!({"_type": {"_name": "ActionTestAttachmentsGroup"}}));
        assert!(AttachmentRecord::from_node(&node).is_none());
        let untyped = Node::from(json!({"name": {"_value": "x"}}));
        assert!(AttachmentRecord::from_node(&untyped).is_none());
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let node = Node::from(json!({"_type": {"_name": "ActionTestAttachment"}}));
        let record = AttachmentRecord::from_node(&node).unwrap();
        assert_eq!(record.name, None);
        assert!(record.uniform_type_identifier.is_empty());
        assert!(!record.is_extractable());
    }

    #[test]
    fn test_is_extractable() {
        let record = |uti: &str, id: &str| AttachmentRecord {
            name: None,
            uniform_type_identifier: uti.to_string(),
            payload_id: id.to_string(),
        };
        assert!(record("public.png", "R").is_extractable());
        assert!(!record("public.jpeg", "R").is_extractable());
        assert!(!record("", "R").is_extractable());
        assert!(!record("public.png", "").is_extractable());
        // Case-sensitive substring
        assert!(!record("public.PNG", "R").is_extractable());
    }

    #[test]
    fn test_file_stem() {
        let mut record = AttachmentRecord {
            name: None,
            uniform_type_identifier: "public.png".to_string(),
            payload_id: "R".to_string(),
        };
        assert_eq!(record.file_stem(3), "screenshot_3");
        record.name = Some("Launch Screen".to_string());
        assert_eq!(record.file_stem(3), "Launch Screen");
        record.name = Some("flows/login\\step".to_string());
        assert_eq!(record.file_stem(0), "flows_login_step");
    }

    #[test]
    fn test_walk_finds_nested_attachments_in_order() {
        let root = Node::from(json!({
            "actions": [
                {"summary": attachment(Some("first"), "public.png", "A")},
                {"_type": {"_name": "ActionTestActivitySummary"},
                 "attachments": [attachment(Some("second"), "public.jpeg", "B")]},
            ],
            "tail": attachment(Some("third"), "public.png", "C"),
        }));
        let names: Vec<Option<String>> =
            collect_attachments(&root).into_iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                Some("first".to_string()),
                Some("second".to_string()),
                Some("third".to_string())
            ]
        );
    }

    #[test]
    fn test_walk_descends_into_matched_node() {
        let mut outer = attachment(Some("outer"), "public.png", "A");
        outer["children"] = json!([attachment(Some("inner"), "public.png", "B")]);
        let records = collect_attachments(&Node::from(outer));
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name.as_deref(), Some("inner"));
    }

    #[test]
    fn test_walk_depth_ceiling() {
        let leaf = || attachment(Some("deep"), "public.png", "A");
        assert_eq!(collect_attachments(&nested(20, leaf())).len(), 1);
        assert_eq!(collect_attachments(&nested(21, leaf())).len(), 0);
        assert_eq!(collect_attachments(&nested(25, leaf())).len(), 0);
    }

    #[test]
    fn test_walk_stops_on_visitor_error() {
        let root = Node::from(json!([
            attachment(Some("a"), "public.png", "A"),
            attachment(Some("b"), "public.png", "B"),
        ]));
        let mut seen = 0;
        let result = find_attachments(&root, 0, &mut |_: AttachmentRecord| {
            seen += 1;
            Err("stop")
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(seen, 1);
    }
}
