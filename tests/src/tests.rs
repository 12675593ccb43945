use std::{collections::BTreeMap, fs, path::Path, sync::Mutex, time::Duration};

use async_trait::async_trait;
use bridge_nft_operations::{mint, BridgeNft, BRIDGE_CONFIG};
use sui_deploy_runner::{
    client::{ChainClient, CompiledPackage, MoveCall, PackageBuilder, Result, TransactionOutcome},
    handle::{deploy_package, mark_active_deployment, upgrade_deployment},
    load_deployment, Network, RegistryError, RegistryStore, Selector,
};
use tempfile::TempDir;

const MOVE_LOCK: &str = "# @generated by Move, please check-in and do not edit manually.

[move]
version = 3

[env]

[env.testnet]
chain-id = \"4c78adac\"
original-published-id = \"0xorig\"
latest-published-id = \"0xorig\"
published-version = \"1\"

[env.mainnet]
chain-id = \"35834a8a\"
original-published-id = \"0xmain\"
latest-published-id = \"0xmain\"
published-version = \"4\"
";

/// In-memory stand-in for the `sui` CLI that hands out sequential ids
struct FakeChain {
    counter: Mutex<u32>,
    with_upgrade_cap: bool,
    upgrade_returns_package: bool,
    calls: Mutex<Vec<MoveCall>>,
}

impl FakeChain {
    fn new() -> Self {
        Self {
            counter: Mutex::new(0),
            with_upgrade_cap: true,
            upgrade_returns_package: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn next(&self) -> u32 {
        let mut counter = self.counter.lock().unwrap();
        *counter += 1;
        *counter
    }
}

#[async_trait]
impl PackageBuilder for FakeChain {
    async fn build(&self, path: &Path) -> Result<CompiledPackage> {
        Ok(CompiledPackage {
            path: path.to_path_buf(),
            modules: vec!["bW9kdWxl".into()],
            dependencies: vec!["0x1".into(), "0x2".into()],
            digest: vec![7; 32],
        })
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    async fn active_address(&self) -> Result<String> {
        Ok("0xadmin".into())
    }

    async fn publish(&self, _package: &CompiledPackage) -> Result<TransactionOutcome> {
        let n = self.next();
        let mut created = BTreeMap::from([
            ("Package".to_string(), format!("0xpkg{n}")),
            (BRIDGE_CONFIG.to_string(), format!("0xcfg{n}")),
        ]);
        if self.with_upgrade_cap {
            created.insert("UpgradeCap".into(), format!("0xcap{n}"));
        }
        Ok(TransactionOutcome {
            digest: format!("publish{n}"),
            created,
        })
    }

    async fn upgrade(
        &self,
        _package: &CompiledPackage,
        current_package_id: &str,
        _upgrade_cap: &str,
    ) -> Result<TransactionOutcome> {
        let n = self.next();
        let mut created = BTreeMap::new();
        if self.upgrade_returns_package {
            created.insert("Package".to_string(), format!("{current_package_id}-v{n}"));
        }
        Ok(TransactionOutcome {
            digest: format!("upgrade{n}"),
            created,
        })
    }

    async fn call(&self, call: &MoveCall) -> Result<TransactionOutcome> {
        self.calls.lock().unwrap().push(call.clone());
        Ok(TransactionOutcome {
            digest: format!("call{}", self.next()),
            created: BTreeMap::new(),
        })
    }
}

struct Workspace {
    dir: TempDir,
    store: RegistryStore,
}

impl Workspace {
    fn new(with_lock: bool) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        if with_lock {
            fs::write(dir.path().join("Move.lock"), MOVE_LOCK).expect("write lock");
        }
        let store = RegistryStore::new(dir.path().join("deployment.json"));
        Self { dir, store }
    }

    fn package_path(&self) -> &Path {
        self.dir.path()
    }

    fn lock(&self) -> String {
        fs::read_to_string(self.dir.path().join("Move.lock")).expect("read lock")
    }

    async fn deploy(&self, chain: &FakeChain, network: Network) -> u64 {
        deploy_package(chain, &self.store, network, self.package_path(), Duration::ZERO)
            .await
            .expect("deploy")
            .id
    }
}

#[tokio::test]
async fn test_publish_activate_upgrade_and_mint() {
    let ws = Workspace::new(true);
    let chain = FakeChain::new();

    assert_eq!(ws.deploy(&chain, Network::Testnet).await, 1);
    assert_eq!(ws.deploy(&chain, Network::Testnet).await, 2);

    let err = load_deployment(ws.store.path(), Network::Testnet, Selector::Active).unwrap_err();
    assert!(matches!(err, RegistryError::NoUsableDeployment { .. }));

    mark_active_deployment(&ws.store, Network::Testnet, 2).expect("mark active");
    let before = load_deployment(ws.store.path(), Network::Testnet, Selector::Active).unwrap();
    assert_eq!(before.package_id, "0xpkg2");
    assert_eq!(before.operators["Admin"], "0xadmin");

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        Selector::Active,
        ws.package_path(),
    )
    .await
    .expect("upgrade")
    .expect("new package");
    assert_eq!(summary.deployment_id, 2);
    assert_eq!(summary.new_package_id, "0xpkg2-v3");

    let after = load_deployment(ws.store.path(), Network::Testnet, Selector::Id(2)).unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert!(after.active);
    assert_eq!(after.package_id, "0xpkg2-v3");
    let last = after.last_upgrade.as_ref().unwrap();
    assert_eq!(last.previous_package_id, "0xpkg2");
    assert_eq!(last.tx_digest, "upgrade3");

    let untouched = load_deployment(ws.store.path(), Network::Testnet, Selector::Id(1)).unwrap();
    assert_eq!(untouched.package_id, "0xpkg1");
    assert!(untouched.last_upgrade.is_none());

    let lock = ws.lock();
    assert!(lock.contains("latest-published-id = \"0xpkg2-v3\"\npublished-version = \"2\""));
    assert!(lock.contains("original-published-id = \"0xorig\""));
    assert!(lock.contains(
        "[env.mainnet]\nchain-id = \"35834a8a\"\noriginal-published-id = \"0xmain\"\nlatest-published-id = \"0xmain\"\npublished-version = \"4\"\n"
    ));
    assert_eq!(summary.lock_patch.unwrap().published_version, 2);

    let nft = BridgeNft::from_deployment(&after).unwrap();
    mint(&chain, &nft, "0xalice").await.expect("mint");
    let calls = chain.calls.lock().unwrap();
    assert_eq!(calls[0].target(), "0xpkg2-v3::bridge_nft::mint");
    assert_eq!(calls[0].arguments, vec!["0xcfg2", "0xalice"]);
}

#[tokio::test]
async fn test_stale_selector_upgrades_active_deployment() {
    let ws = Workspace::new(true);
    let chain = FakeChain::new();
    ws.deploy(&chain, Network::Testnet).await;
    mark_active_deployment(&ws.store, Network::Testnet, 1).unwrap();

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        Selector::Id(7),
        ws.package_path(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(summary.deployment_id, 1);
}

#[tokio::test]
async fn test_upgrade_without_lock_file_still_records() {
    let ws = Workspace::new(false);
    let chain = FakeChain::new();
    ws.deploy(&chain, Network::Devnet).await;
    mark_active_deployment(&ws.store, Network::Devnet, 1).unwrap();

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Devnet,
        Selector::Active,
        ws.package_path(),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(summary.lock_patch.is_none());
    assert!(!ws.package_path().join("Move.lock").exists());
    let record = load_deployment(ws.store.path(), Network::Devnet, Selector::Active).unwrap();
    assert_eq!(record.package_id, summary.new_package_id);
}

#[tokio::test]
async fn test_upgrade_requires_upgrade_cap() {
    let ws = Workspace::new(true);
    let chain = FakeChain {
        with_upgrade_cap: false,
        ..FakeChain::new()
    };
    ws.deploy(&chain, Network::Testnet).await;
    mark_active_deployment(&ws.store, Network::Testnet, 1).unwrap();

    let err = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        Selector::Active,
        ws.package_path(),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<RegistryError>(),
        Some(RegistryError::MissingUpgradeCapability { id: 1, .. })
    ));
    let message = err.to_string();
    assert!(message.contains("Available deployments:"));
    assert!(message.contains("#1 ("));
    assert!(message.contains("[ACTIVE]"));
    assert_eq!(ws.lock(), MOVE_LOCK);
}

#[tokio::test]
async fn test_mistyped_selector_upgrades_active_deployment() {
    let ws = Workspace::new(true);
    let chain = FakeChain::new();
    ws.deploy(&chain, Network::Testnet).await;
    ws.deploy(&chain, Network::Testnet).await;
    mark_active_deployment(&ws.store, Network::Testnet, 2).unwrap();

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        "abc".parse().unwrap(),
        ws.package_path(),
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(summary.deployment_id, 2);
    assert_eq!(summary.last_upgrade.previous_package_id, "0xpkg2");
}

#[tokio::test]
async fn test_unusable_lock_version_is_left_alone() {
    let ws = Workspace::new(false);
    let lock = MOVE_LOCK.replace(
        "published-version = \"1\"",
        &format!("published-version = \"{}\"", u64::MAX),
    );
    fs::write(ws.package_path().join("Move.lock"), &lock).unwrap();
    let chain = FakeChain::new();
    ws.deploy(&chain, Network::Testnet).await;
    mark_active_deployment(&ws.store, Network::Testnet, 1).unwrap();

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        Selector::Active,
        ws.package_path(),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(summary.lock_patch.is_none());
    assert_eq!(ws.lock(), lock);
    let record = load_deployment(ws.store.path(), Network::Testnet, Selector::Active).unwrap();
    assert_eq!(record.package_id, summary.new_package_id);
}

#[tokio::test]
async fn test_upgrade_without_new_package_changes_nothing() {
    let ws = Workspace::new(true);
    let chain = FakeChain {
        upgrade_returns_package: false,
        ..FakeChain::new()
    };
    ws.deploy(&chain, Network::Testnet).await;
    mark_active_deployment(&ws.store, Network::Testnet, 1).unwrap();
    let before = fs::read_to_string(ws.store.path()).unwrap();

    let summary = upgrade_deployment(
        &chain,
        &ws.store,
        Network::Testnet,
        Selector::Active,
        ws.package_path(),
    )
    .await
    .unwrap();
    assert!(summary.is_none());
    assert_eq!(fs::read_to_string(ws.store.path()).unwrap(), before);
    assert_eq!(ws.lock(), MOVE_LOCK);
}

#[tokio::test]
async fn test_mark_active_unknown_id_keeps_registry() {
    let ws = Workspace::new(false);
    let chain = FakeChain::new();
    ws.deploy(&chain, Network::Mainnet).await;
    mark_active_deployment(&ws.store, Network::Mainnet, 1).unwrap();
    let before = fs::read_to_string(ws.store.path()).unwrap();

    let err = mark_active_deployment(&ws.store, Network::Mainnet, 3).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("deployment #3 not found on mainnet"));
    assert!(message.contains("#1 ("));
    assert!(message.contains("[ACTIVE]"));
    assert_eq!(fs::read_to_string(ws.store.path()).unwrap(), before);
}

#[test]
fn test_networks_do_not_share_ids() {
    let ws = Workspace::new(false);
    let chain = FakeChain::new();
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        ws.deploy(&chain, Network::Testnet).await;
        ws.deploy(&chain, Network::Testnet).await;
        assert_eq!(ws.deploy(&chain, Network::Mainnet).await, 1);
    });
    let registry: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(ws.store.path()).unwrap()).unwrap();
    assert_eq!(registry["testnet"]["deployments"].as_array().unwrap().len(), 2);
    assert_eq!(registry["mainnet"]["deployments"][0]["Package"], "0xpkg3");
    assert_eq!(registry["devnet"]["deployments"], serde_json::json!([]));
}
