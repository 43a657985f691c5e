//! Session store DTOs and migrations.

use super::history::HistoryItemDto;
use super::value::{ScopeDto, decode_scope, encode_scope};
use serde::{Deserialize, Serialize};
use tabcalc_core::error::Result;
use tabcalc_core::history::HistoryLog;
use tabcalc_core::session::{DEFAULT_SESSION_LABEL, Session, SessionStore};
use version_migrate::{IntoDomain, MigratesTo, Versioned};

/// Flat layout V1.0.0: a single calculator, stored under two keys.
///
/// Never written any more; only read and migrated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
pub struct FlatLayoutV1_0_0 {
    /// Contents of `calc-history`.
    #[serde(default)]
    pub history: Vec<HistoryItemDto>,
    /// Contents of `calc-scope`.
    #[serde(default)]
    pub scope: ScopeDto,
}

/// One tab of the sessioned layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabV1_1_0 {
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub history: Vec<HistoryItemDto>,
    #[serde(default)]
    pub scope: ScopeDto,
}

fn default_label() -> String {
    DEFAULT_SESSION_LABEL.to_string()
}

/// Sessioned layout V1.1.0, stored under `calculator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionStoreV1_1_0 {
    #[serde(default)]
    pub tabs: Vec<TabV1_1_0>,
    /// Signed so that corrupt negative indices decode and get clamped.
    #[serde(default)]
    pub active_tab: i64,
}

/// Type alias for the latest store version.
pub type SessionStoreDTO = SessionStoreV1_1_0;

// ============================================================================
// Migration implementations
// ============================================================================

/// Migration from FlatLayoutV1_0_0 to SessionStoreV1_1_0.
///
/// The flat history and scope become the single, active tab.
impl MigratesTo<SessionStoreV1_1_0> for FlatLayoutV1_0_0 {
    fn migrate(self) -> SessionStoreV1_1_0 {
        SessionStoreV1_1_0 {
            tabs: vec![TabV1_1_0 {
                label: default_label(),
                history: self.history,
                scope: self.scope,
            }],
            active_tab: 0,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl From<TabV1_1_0> for Session {
    fn from(tab: TabV1_1_0) -> Self {
        Session {
            label: tab.label,
            history: tab.history.into_iter().map(Into::into).collect::<HistoryLog>(),
            scope: decode_scope(tab.scope),
        }
    }
}

impl IntoDomain<SessionStore> for SessionStoreV1_1_0 {
    fn into_domain(self) -> SessionStore {
        let sessions: Vec<Session> = self.tabs.into_iter().map(Session::from).collect();
        let active_index = usize::try_from(self.active_tab).unwrap_or(0);
        SessionStore::from_parts(sessions, active_index)
    }
}

impl IntoDomain<SessionStore> for FlatLayoutV1_0_0 {
    fn into_domain(self) -> SessionStore {
        self.migrate().into_domain()
    }
}

impl From<&Session> for TabV1_1_0 {
    fn from(session: &Session) -> Self {
        TabV1_1_0 {
            label: session.label.clone(),
            history: session.history.iter().map(HistoryItemDto::from).collect(),
            scope: encode_scope(&session.scope),
        }
    }
}

/// Convert domain model to SessionStoreV1_1_0 DTO for persistence.
impl From<&SessionStore> for SessionStoreV1_1_0 {
    fn from(store: &SessionStore) -> Self {
        SessionStoreV1_1_0 {
            tabs: store.sessions().iter().map(TabV1_1_0::from).collect(),
            active_tab: store.active_index() as i64,
        }
    }
}

/// Serializes a store in the current layout.
pub fn encode_store(store: &SessionStore) -> Result<String> {
    Ok(serde_json::to_string(&SessionStoreDTO::from(store))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabcalc_core::evaluation::EvaluationResult;
    use tabcalc_core::value::Value;

    #[test]
    fn test_store_document_shape() {
        let mut store = SessionStore::default_store();
        store.record_evaluation(EvaluationResult::success("1+1", "1 + 1", "1+1", Value::Number(2.0)));

        let json: serde_json::Value = serde_json::from_str(&encode_store(&store).unwrap()).unwrap();
        assert_eq!(
            json,
            json!({
                "tabs": [{
                    "label": "Tab 1",
                    "history": [{
                        "error": false,
                        "original": "1+1",
                        "expression": "1 + 1",
                        "TeX": "1+1",
                        "result": 2.0
                    }],
                    "scope": {"ans": 2.0}
                }],
                "activeTab": 0
            })
        );
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = SessionStore::default_store();
        store.create_session("Tab");
        store.record_evaluation(EvaluationResult::failure("*", "Value expected (char 1)"));
        store.rename_session(0, "Budget").unwrap();

        let dto: SessionStoreDTO = serde_json::from_str(&encode_store(&store).unwrap()).unwrap();
        assert_eq!(dto.into_domain(), store);
    }

    #[test]
    fn test_flat_layout_migrates_to_single_tab() {
        let flat: FlatLayoutV1_0_0 = serde_json::from_value(json!({
            "history": [{"expression": "5", "result": 5}],
            "scope": {"ans": 5}
        }))
        .unwrap();

        let store: SessionStore = flat.into_domain();
        assert_eq!(store.len(), 1);
        assert_eq!(store.active_index(), 0);
        assert_eq!(store.active_session().label, DEFAULT_SESSION_LABEL);
        assert_eq!(store.active_session().scope.ans(), &Value::Number(5.0));
        assert_eq!(store.active_session().history.len(), 1);
    }

    #[test]
    fn test_corrupt_active_tab_is_clamped() {
        let dto: SessionStoreDTO = serde_json::from_value(json!({
            "tabs": [{"label": "a"}, {"label": "b"}],
            "activeTab": -3
        }))
        .unwrap();
        assert_eq!(dto.clone().into_domain().active_index(), 0);

        let dto = SessionStoreDTO {
            active_tab: 7,
            ..dto
        };
        assert_eq!(dto.into_domain().active_index(), 1);
    }

    #[test]
    fn test_empty_tab_list_gives_default_store() {
        let dto: SessionStoreDTO = serde_json::from_value(json!({})).unwrap();
        assert_eq!(dto.into_domain(), SessionStore::default_store());
    }
}
