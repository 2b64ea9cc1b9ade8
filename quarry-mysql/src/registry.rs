//! Named connection registry.
//!
//! A [`Registry`] maps aliases to pooled connections. The alias map sits behind
//! an async `RwLock` and every entry owns its own `Mutex`, so opening or closing
//! one alias never waits on traffic to another.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use quarry_mysql::{ConnectionConfig, Dsn, Registry};
//!
//! # async fn run() -> quarry_query::QueryResult<()> {
//! let registry = Arc::new(Registry::mysql());
//! registry
//!     .connect([ConnectionConfig::new(
//!         "default",
//!         Dsn::new("127.0.0.1", "shop").user("app").password("secret"),
//!     )
//!     .max_open(20)])
//!     .await?;
//!
//! let handle = registry.get(&[]).await?;
//! # drop(handle);
//! registry.close_all().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use quarry_query::error::{QueryError, QueryResult};

use crate::config::{ConnectionConfig, Dsn, PoolLimits};
use crate::driver::{Connector, Handle};
use crate::pool::MysqlConnector;

/// Alias used when none is given.
pub const DEFAULT_ALIAS: &str = "default";

/// Connection state of an entry.
enum Slot<H> {
    Open(H),
    Closed,
    /// Replaced by a newer entry under the same alias; never reopened.
    Retired,
}

/// One registered connection.
struct Entry<H> {
    dsn: Dsn,
    endpoint: String,
    limits: PoolLimits,
    slot: Mutex<Slot<H>>,
}

impl<H: Handle> Entry<H> {
    fn new(dsn: Dsn, endpoint: String, limits: PoolLimits, handle: H) -> Self {
        Self {
            dsn,
            endpoint,
            limits,
            slot: Mutex::new(Slot::Open(handle)),
        }
    }

    /// The handle if the entry is open.
    async fn current(&self) -> Option<H> {
        match &*self.slot.lock().await {
            Slot::Open(handle) => Some(handle.clone()),
            Slot::Closed | Slot::Retired => None,
        }
    }

    /// The handle, reopening a closed entry first.
    ///
    /// Returns `None` for a retired entry: the alias now points elsewhere.
    async fn get_or_reopen<C>(&self, connector: &C) -> QueryResult<Option<H>>
    where
        C: Connector<Handle = H>,
    {
        let mut slot = self.slot.lock().await;
        match &*slot {
            Slot::Open(handle) => return Ok(Some(handle.clone())),
            Slot::Retired => return Ok(None),
            Slot::Closed => {}
        }

        let handle = connector.open(&self.dsn, self.limits).await?;
        info!(endpoint = %self.endpoint, "Reopened closed connection");
        *slot = Slot::Open(handle.clone());
        Ok(Some(handle))
    }

    /// Close the entry. Returns `false` if it was not open.
    ///
    /// The entry counts as closed even when the driver reports a failure.
    async fn close(&self) -> QueryResult<bool> {
        self.shut(Slot::Closed).await
    }

    /// Close the entry for good after it was replaced.
    async fn retire(&self) -> QueryResult<bool> {
        self.shut(Slot::Retired).await
    }

    async fn shut(&self, next: Slot<H>) -> QueryResult<bool> {
        let previous = {
            let mut slot = self.slot.lock().await;
            if matches!(*slot, Slot::Retired) {
                return Ok(false);
            }
            std::mem::replace(&mut *slot, next)
        };
        // Closing may wait for checked-out connections to come back.
        match previous {
            Slot::Open(handle) => handle.close().await.map(|_| true),
            Slot::Closed | Slot::Retired => Ok(false),
        }
    }

    async fn is_open(&self) -> bool {
        matches!(*self.slot.lock().await, Slot::Open(_))
    }
}

/// Alias → connection map shared by every model.
pub struct Registry<C: Connector = MysqlConnector> {
    connector: C,
    entries: RwLock<IndexMap<String, Arc<Entry<C::Handle>>>>,
}

impl Registry<MysqlConnector> {
    /// A registry backed by `mysql_async`.
    pub fn mysql() -> Self {
        Self::new(MysqlConnector::new())
    }
}

impl Default for Registry<MysqlConnector> {
    fn default() -> Self {
        Self::mysql()
    }
}

impl<C: Connector> Registry<C> {
    /// Create an empty registry using `connector` to open pools.
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            entries: RwLock::new(IndexMap::new()),
        }
    }

    /// The connector used to open pools.
    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect every config, replacing existing aliases.
    ///
    /// Failing configs are skipped; the remaining ones are still installed and
    /// all failures are returned together as `index: message` lines. Disabled
    /// configs are skipped silently.
    pub async fn connect(
        &self,
        configs: impl IntoIterator<Item = ConnectionConfig>,
    ) -> QueryResult<()> {
        let configs: Vec<ConnectionConfig> = configs.into_iter().collect();
        if configs.is_empty() {
            return Err(QueryError::invalid_configuration(
                "no connection config supplied",
            ));
        }

        let mut failures = Vec::new();
        let mut code = None;
        for (index, config) in configs.into_iter().enumerate() {
            if let Err(e) = self.connect_one(config).await {
                warn!(index, error = %e, "Connection config rejected");
                code.get_or_insert(e.code);
                failures.push(format!("{}: {}", index, e.message));
            }
        }

        match code {
            None => Ok(()),
            Some(code) => Err(QueryError::aggregate("connect", failures, code)),
        }
    }

    /// Connect a single config, replacing the alias if it exists.
    pub async fn connect_one(&self, config: ConnectionConfig) -> QueryResult<()> {
        if !config.enabled {
            debug!(alias = %config.alias, "Skipping disabled connection config");
            return Ok(());
        }
        let alias = config.alias.trim().to_string();
        if alias.is_empty() {
            return Err(QueryError::empty_alias());
        }

        let endpoint = config.dsn.redacted()?;
        let limits = config.limits();
        let handle = self.connector.connect(&config.dsn, limits).await?;
        let entry = Arc::new(Entry::new(config.dsn, endpoint.clone(), limits, handle));

        // Only the swap happens under the map lock; the old pool drains afterwards.
        let previous = self.entries.write().await.insert(alias.clone(), entry);

        match previous {
            Some(old) => {
                info!(alias = %alias, endpoint = %endpoint, "Connection replaced");
                if let Err(e) = old.retire().await {
                    warn!(alias = %alias, error = %e, "Failed to close replaced connection");
                }
            }
            None => info!(alias = %alias, endpoint = %endpoint, "Connection registered"),
        }
        Ok(())
    }

    /// Resolve a handle.
    ///
    /// Returns the first listed alias that is open. Otherwise falls back to
    /// `default`, reopening it if it was closed.
    pub async fn get(&self, aliases: &[&str]) -> QueryResult<C::Handle> {
        let mut unknown = Vec::new();
        let (candidates, mut fallback) = {
            let entries = self.entries.read().await;
            let mut candidates = Vec::with_capacity(aliases.len());
            for alias in aliases {
                match entries.get(*alias) {
                    Some(entry) => candidates.push((*alias, Arc::clone(entry))),
                    None => unknown.push(format!("database connection `{}` is not configured", alias)),
                }
            }
            (candidates, entries.get(DEFAULT_ALIAS).cloned())
        };

        for (alias, entry) in candidates {
            if let Some(handle) = entry.current().await {
                return Ok(handle);
            }
            debug!(alias, "Connection closed, trying next alias");
        }

        loop {
            let Some(entry) = fallback else {
                let mut err = QueryError::not_configured(DEFAULT_ALIAS);
                err.context.related = unknown;
                return Err(err);
            };
            if let Some(handle) = entry.get_or_reopen(&self.connector).await? {
                return Ok(handle);
            }
            debug!("Default connection was replaced, resolving again");
            fallback = self.entries.read().await.get(DEFAULT_ALIAS).cloned();
        }
    }

    /// Close the named aliases.
    ///
    /// Unknown and already closed aliases are reported without stopping the
    /// remaining ones.
    pub async fn close(&self, aliases: &[&str]) -> QueryResult<()> {
        let mut failures = Vec::new();
        let mut code = None;

        for alias in aliases {
            let entry = self.entries.read().await.get(*alias).cloned();
            let result = match entry {
                None => Err(QueryError::not_configured(*alias)),
                Some(entry) => match entry.close().await {
                    Ok(true) => {
                        info!(alias, "Connection closed");
                        Ok(())
                    }
                    Ok(false) => Err(QueryError::connection_closed(*alias)),
                    Err(e) => Err(e),
                },
            };
            if let Err(e) = result {
                code.get_or_insert(e.code);
                failures.push(e.message);
            }
        }

        match code {
            None => Ok(()),
            Some(code) => Err(QueryError::aggregate("close", failures, code)),
        }
    }

    /// Close every open entry. Failures are logged.
    pub async fn close_all(&self) {
        let entries: Vec<(String, Arc<Entry<C::Handle>>)> = self
            .entries
            .read()
            .await
            .iter()
            .map(|(alias, entry)| (alias.clone(), Arc::clone(entry)))
            .collect();

        for (alias, entry) in entries {
            match entry.close().await {
                Ok(true) => info!(alias = %alias, "Connection closed"),
                Ok(false) => {}
                Err(e) => warn!(alias = %alias, error = %e, "Failed to close connection"),
            }
        }
    }

    /// Registered aliases in registration order.
    pub async fn aliases(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    /// True if the alias has been registered.
    pub async fn contains(&self, alias: &str) -> bool {
        self.entries.read().await.contains_key(alias)
    }

    /// True if the alias is registered and open.
    pub async fn is_open(&self, alias: &str) -> bool {
        let entry = self.entries.read().await.get(alias).cloned();
        match entry {
            Some(entry) => entry.is_open().await,
            None => false,
        }
    }

    /// Table prefix configured on the alias.
    pub async fn prefix(&self, alias: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .get(alias)
            .map(|entry| entry.dsn.prefix.clone())
    }
}

impl<C: Connector> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").finish_non_exhaustive()
    }
}
