//! Proxy convention resolution
//!
//! Deployed contracts indicate a delegate implementation through one of
//! several ad-hoc conventions. Detection is checked in fixed priority order,
//! first match wins:
//!
//! 1. a view method named exactly `implementation` (legacy),
//! 2. a view method named exactly `get_implementation` (Argent-X),
//! 3. a fixed storage slot derived from `Proxy_implementation_hash`
//!    (OpenZeppelin), when a live storage channel exists.

use std::collections::HashMap;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::debug;

use crate::abi::ContractAbi;
use crate::address::ContractAddress;
use crate::felt::{felt_from_str, Felt};
use crate::provider::ChainAccess;
use crate::selector::storage_var_address;
use crate::StarknetError;

/// The recognized proxy conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyKind {
    /// `implementation()` view method
    Legacy,
    /// `get_implementation()` view method
    ArgentX,
    /// `Proxy_implementation_hash` storage slot
    OpenZeppelin,
}

/// A resolved proxy: delegate target plus the convention that matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyInfo {
    /// The delegate implementation address
    pub target: ContractAddress,
    /// The convention that established the target
    pub kind: ProxyKind,
}

/// The storage slot read for the OpenZeppelin convention.
pub fn oz_proxy_storage_key() -> Felt {
    storage_var_address("Proxy_implementation_hash")
}

/// Determine whether `address` follows a recognized proxy convention.
///
/// Returns `Ok(None)` when no convention matches or the resolved target is
/// zero. The view-method and storage calls are blocking network operations;
/// a failed call surfaces immediately.
pub fn resolve_proxy<C: ChainAccess>(
    chain: &C,
    address: &ContractAddress,
    contract_type: &ContractAbi,
) -> Result<Option<ProxyInfo>, StarknetError> {
    let mut target: Option<Felt> = None;
    let mut kind: Option<ProxyKind> = None;

    if contract_type.view_method("implementation").is_some() {
        target = Some(chain.invoke_view_method(address, "implementation")?);
        kind = Some(ProxyKind::Legacy);
    } else if contract_type.view_method("get_implementation").is_some() {
        target = Some(chain.invoke_view_method(address, "get_implementation")?);
        kind = Some(ProxyKind::ArgentX);
    } else if let Some(raw) = chain.read_storage(address.felt(), oz_proxy_storage_key())? {
        if raw != "0x0" {
            target = Some(felt_from_str(&raw)?);
            kind = Some(ProxyKind::OpenZeppelin);
        }
    }

    match (target, kind) {
        (Some(target), Some(kind)) if !target.is_zero() => {
            debug!(%address, ?kind, "resolved proxy");
            Ok(Some(ProxyInfo {
                target: ContractAddress::from_felt(target),
                kind,
            }))
        }
        _ => Ok(None),
    }
}

/// Per-ecosystem cache of proxy resolutions, keyed by address.
///
/// Negative results are cached too; resolution for an address runs at most
/// once until the cache is cleared.
#[derive(Debug, Default)]
pub struct ProxyCache {
    entries: RwLock<HashMap<Felt, Option<ProxyInfo>>>,
}

impl ProxyCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached result for `address`, resolving and storing it on a
    /// miss.
    ///
    /// The upgradable lock is held across `resolve`, so concurrent lookups
    /// of a cold address run the resolution exactly once; plain cached reads
    /// are never blocked by it.
    pub fn get_or_resolve(
        &self,
        address: &ContractAddress,
        resolve: impl FnOnce() -> Result<Option<ProxyInfo>, StarknetError>,
    ) -> Result<Option<ProxyInfo>, StarknetError> {
        let entries = self.entries.upgradable_read();
        if let Some(cached) = entries.get(&address.felt()) {
            return Ok(*cached);
        }
        let resolved = resolve()?;
        RwLockUpgradableReadGuard::upgrade(entries).insert(address.felt(), resolved);
        Ok(resolved)
    }

    /// Drop all cached resolutions.
    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockChain;

    fn proxy_abi(view_names: &[&str]) -> ContractAbi {
        let entries = view_names
            .iter()
            .map(|name| {
                format!(
                    r#"{{"type": "function", "name": "{name}",
                         "stateMutability": "view", "inputs": [],
                         "outputs": [{{"name": "address", "type": "felt"}}]}}"#
                )
            })
            .collect::<Vec<_>>()
            .join(",");
        ContractAbi::from_json(&format!("[{entries}]")).unwrap()
    }

    fn addr(value: u64) -> ContractAddress {
        ContractAddress::from_felt(Felt::from(value))
    }

    #[test]
    fn test_legacy_convention() {
        let address = addr(1);
        let chain = MockChain::new().with_view_result(address, "implementation", Felt::from(9u64));
        let info = resolve_proxy(&chain, &address, &proxy_abi(&["implementation"]))
            .unwrap()
            .unwrap();
        assert_eq!(info.kind, ProxyKind::Legacy);
        assert_eq!(info.target.felt(), Felt::from(9u64));
    }

    #[test]
    fn test_legacy_takes_priority_over_argent_x() {
        let address = addr(1);
        let chain = MockChain::new()
            .with_view_result(address, "implementation", Felt::from(9u64))
            .with_view_result(address, "get_implementation", Felt::from(8u64));
        let abi = proxy_abi(&["implementation", "get_implementation"]);
        let info = resolve_proxy(&chain, &address, &abi).unwrap().unwrap();
        assert_eq!(info.kind, ProxyKind::Legacy);
        assert_eq!(info.target.felt(), Felt::from(9u64));
    }

    #[test]
    fn test_argent_x_convention() {
        let address = addr(1);
        let chain =
            MockChain::new().with_view_result(address, "get_implementation", Felt::from(8u64));
        let info = resolve_proxy(&chain, &address, &proxy_abi(&["get_implementation"]))
            .unwrap()
            .unwrap();
        assert_eq!(info.kind, ProxyKind::ArgentX);
    }

    #[test]
    fn test_open_zeppelin_convention() {
        let address = addr(1);
        let chain =
            MockChain::new().with_storage(address.felt(), oz_proxy_storage_key(), "0x1234");
        let info = resolve_proxy(&chain, &address, &ContractAbi::default())
            .unwrap()
            .unwrap();
        assert_eq!(info.kind, ProxyKind::OpenZeppelin);
        assert_eq!(info.target.felt(), Felt::from(0x1234u64));
    }

    #[test]
    fn test_zero_storage_value_means_absent() {
        let address = addr(1);
        let chain = MockChain::new().with_empty_storage();
        let info = resolve_proxy(&chain, &address, &ContractAbi::default()).unwrap();
        assert!(info.is_none());
    }

    #[test]
    fn test_no_storage_channel_means_absent() {
        let address = addr(1);
        let info = resolve_proxy(&MockChain::new(), &address, &ContractAbi::default()).unwrap();
        assert!(info.is_none());
    }

    #[test]
    fn test_zero_target_means_absent() {
        let address = addr(1);
        let chain = MockChain::new().with_view_result(address, "implementation", Felt::zero());
        let info = resolve_proxy(&chain, &address, &proxy_abi(&["implementation"])).unwrap();
        assert!(info.is_none());
    }

    #[test]
    fn test_non_view_method_does_not_match() {
        // A non-view "implementation" function is not a proxy marker.
        let abi = ContractAbi::from_json(
            r#"[{"type": "function", "name": "implementation",
                 "inputs": [], "outputs": []}]"#,
        )
        .unwrap();
        let info = resolve_proxy(&MockChain::new(), &addr(1), &abi).unwrap();
        assert!(info.is_none());
    }

    #[test]
    fn test_cache_resolves_once() {
        let cache = ProxyCache::new();
        let address = addr(1);
        let info = ProxyInfo {
            target: addr(9),
            kind: ProxyKind::Legacy,
        };

        let first = cache.get_or_resolve(&address, || Ok(Some(info))).unwrap();
        assert_eq!(first, Some(info));

        // Second lookup must hit the cache.
        let second = cache
            .get_or_resolve(&address, || panic!("resolver called twice"))
            .unwrap();
        assert_eq!(second, Some(info));
    }

    #[test]
    fn test_cold_address_resolves_once_across_threads() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let cache = ProxyCache::new();
        let address = addr(1);
        let calls = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let info = cache
                        .get_or_resolve(&address, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            Ok(Some(ProxyInfo {
                                target: addr(9),
                                kind: ProxyKind::Legacy,
                            }))
                        })
                        .unwrap();
                    assert_eq!(info.unwrap().target, addr(9));
                });
            }
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cache_stores_negative_results() {
        let cache = ProxyCache::new();
        let address = addr(1);
        assert_eq!(cache.get_or_resolve(&address, || Ok(None)).unwrap(), None);
        let cached = cache
            .get_or_resolve(&address, || panic!("resolver called twice"))
            .unwrap();
        assert_eq!(cached, None);
    }

    #[test]
    fn test_cache_error_is_not_cached() {
        let cache = ProxyCache::new();
        let address = addr(1);
        let result = cache.get_or_resolve(&address, || {
            Err(StarknetError::Provider("unreachable node".to_string()))
        });
        assert!(result.is_err());

        // A later successful resolution still runs.
        let info = cache
            .get_or_resolve(&address, || {
                Ok(Some(ProxyInfo {
                    target: addr(2),
                    kind: ProxyKind::ArgentX,
                }))
            })
            .unwrap();
        assert!(info.is_some());
    }

    #[test]
    fn test_cache_clear() {
        let cache = ProxyCache::new();
        let address = addr(1);
        cache.get_or_resolve(&address, || Ok(None)).unwrap();
        cache.clear();
        let resolved = cache
            .get_or_resolve(&address, || {
                Ok(Some(ProxyInfo {
                    target: addr(2),
                    kind: ProxyKind::Legacy,
                }))
            })
            .unwrap();
        assert!(resolved.is_some());
    }
}
