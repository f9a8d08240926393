//! プロセス全体で共有する遅延初期化キャッシュ
//!
//! モデルとサンプル画像は最初の利用時に一度だけ構築し、以後は同じ `Arc` を返します。
//! 再構築したい場合は `clear()` を明示的に呼び出します。

use std::sync::{Arc, Mutex, MutexGuard};

pub struct OnceCache<T: ?Sized> {
    slot: Mutex<Option<Arc<T>>>,
}

impl<T: ?Sized> Default for OnceCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> OnceCache<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<T>>> {
        // 初期化中のパニックで毒化しても中身は None か完成済みの値のどちらか
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// キャッシュ済みの値を返す。未初期化なら `init` を実行して保存する
    ///
    /// ロックを保持したまま `init` を呼ぶため、同時に呼ばれても初期化は1回だけ。
    /// `init` が失敗した場合は何も保存せず、次回の呼び出しで再試行される。
    pub fn get_or_try_init<E, F>(&self, init: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Result<Arc<T>, E>,
    {
        let mut slot = self.lock();
        if let Some(value) = slot.as_ref() {
            return Ok(Arc::clone(value));
        }
        let value = init()?;
        *slot = Some(Arc::clone(&value));
        Ok(value)
    }

    pub fn get(&self) -> Option<Arc<T>> {
        self.lock().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().is_some()
    }

    /// 構築済みの値で置き換える
    pub fn set(&self, value: Arc<T>) {
        *self.lock() = Some(value);
    }

    /// キャッシュを破棄する（次回アクセス時に再構築）
    pub fn clear(&self) {
        self.lock().take();
    }
}
