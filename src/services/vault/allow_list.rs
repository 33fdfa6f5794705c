/*
 * Responsibility
 * - 受け付ける vault ID の集合 (起動時に VAULT_IDS から読み込む。以後不変)
 * - 件数が少ない前提なので線形探索で十分
 */

#[derive(Debug, Clone, Default)]
pub struct VaultAllowList {
    ids: Vec<String>,
}

impl VaultAllowList {
    pub fn new(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, vault_id: &str) -> bool {
        self.ids.iter().any(|id| id == vault_id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
