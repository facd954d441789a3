//! End-to-end behavior of the running catalog system.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::app_system::CatalogSystem;
use crate::clients::MutationIntent;
use crate::config::ServerConfig;
use crate::domain::{Product, ProductFields};
use crate::error::StoreError;
use crate::notifier::Snapshot;
use crate::persistence::{FileBackend, MemoryBackend, SnapshotBackend};
use crate::session::SessionId;

fn start(backend: Arc<dyn SnapshotBackend>) -> CatalogSystem {
    CatalogSystem::start(&ServerConfig::default(), backend).unwrap()
}

async fn subscribe(system: &CatalogSystem) -> mpsc::Receiver<Snapshot<Product>> {
    let (tx, mut rx) = mpsc::channel(16);
    system.gateway.subscribe(tx).await.unwrap();
    // initial sync
    rx.recv().await.unwrap();
    rx
}

#[tokio::test]
async fn test_fideos_scenario() {
    let system = start(Arc::new(MemoryBackend::new()));

    let created = system
        .gateway
        .create_product(ProductFields::new("Fideos", 1.5, 85))
        .await
        .unwrap();
    assert_eq!(system.gateway.catalog().len(), 1);

    let updated = system
        .gateway
        .update_product(created.id, ProductFields::new("Fideos", 2.0, 80))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    let catalog = system.gateway.catalog();
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0].price, 2.0);
    assert_eq!(catalog[0].stock, 80);

    assert!(system.gateway.delete_product(created.id).await.unwrap().is_some());
    assert!(system.gateway.catalog().is_empty());

    assert_eq!(system.gateway.delete_product(created.id).await.unwrap(), None);
    assert!(system.gateway.catalog().is_empty());
}

#[tokio::test]
async fn test_each_mutation_broadcasts_the_committed_catalog_once() {
    let system = start(Arc::new(MemoryBackend::new()));
    let mut first = subscribe(&system).await;
    let mut second = subscribe(&system).await;

    let a = system
        .gateway
        .create_product(ProductFields::new("Arroz", 1.0, 10))
        .await
        .unwrap();
    for rx in [&mut first, &mut second] {
        assert_eq!(rx.recv().await.unwrap(), system.gateway.catalog());
        assert!(rx.try_recv().is_err());
    }

    system
        .gateway
        .update_product(a.id, ProductFields::new("Arroz", 1.2, 9))
        .await
        .unwrap();
    for rx in [&mut first, &mut second] {
        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot[0].price, 1.2);
        assert!(rx.try_recv().is_err());
    }

    system.gateway.delete_product(a.id).await.unwrap();
    for rx in [&mut first, &mut second] {
        assert!(rx.recv().await.unwrap().is_empty());
        assert!(rx.try_recv().is_err());
    }
}

#[tokio::test]
async fn test_failed_or_noop_mutations_do_not_broadcast() {
    let backend = Arc::new(MemoryBackend::new());
    let system = start(backend.clone());
    let mut rx = subscribe(&system).await;

    let err = system
        .gateway
        .create_product(ProductFields::new("", 1.0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let err = system
        .gateway
        .update_product(404, ProductFields::new("Arroz", 1.0, 1))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::NotFound("404".to_string()));

    assert_eq!(system.gateway.delete_product(404).await.unwrap(), None);

    backend.set_fail_writes(true);
    let err = system
        .gateway
        .create_product(ProductFields::new("Arroz", 1.0, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Persistence(_)));

    assert!(system.gateway.catalog().is_empty());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_late_subscriber_receives_current_catalog() {
    let system = start(Arc::new(MemoryBackend::new()));
    system
        .gateway
        .create_product(ProductFields::new("Fideos", 1.5, 85))
        .await
        .unwrap();
    system
        .gateway
        .create_product(ProductFields::new("Yerba", 3.0, 12))
        .await
        .unwrap();

    let (tx, mut rx) = mpsc::channel(4);
    system.gateway.subscribe(tx).await.unwrap();

    let initial = rx.recv().await.unwrap();
    assert_eq!(initial, system.gateway.catalog());
    let titles: Vec<_> = initial.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["Fideos", "Yerba"]);
}

#[tokio::test]
async fn test_unsubscribed_client_receives_nothing_more() {
    let system = start(Arc::new(MemoryBackend::new()));
    let (tx, mut rx) = mpsc::channel(4);
    let id = system.gateway.subscribe(tx).await.unwrap();
    rx.recv().await.unwrap();

    assert!(system.gateway.unsubscribe(id).await.unwrap());
    assert!(!system.gateway.unsubscribe(id).await.unwrap());

    system
        .gateway
        .create_product(ProductFields::new("Fideos", 1.5, 85))
        .await
        .unwrap();
    // the notifier dropped the only sender
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_interleaved_creates_are_not_lost() {
    let backend = Arc::new(MemoryBackend::with_write_delay(Duration::from_millis(20)));
    let system = start(backend.clone());

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let gateway = system.gateway.clone();
            tokio::spawn(async move {
                gateway
                    .create_product(ProductFields::new(format!("Producto {i}"), 1.0, i))
                    .await
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let catalog = system.gateway.catalog();
    assert_eq!(catalog.len(), 8);
    let mut ids: Vec<_> = catalog.iter().map(|p| p.id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 8);

    let persisted: Vec<Product> = crate::actor_framework::load_records(backend.as_ref()).unwrap();
    assert_eq!(persisted.as_slice(), catalog.as_slice());
}

#[tokio::test]
async fn test_live_intents_apply_and_broadcast() {
    let system = start(Arc::new(MemoryBackend::new()));
    let mut rx = subscribe(&system).await;

    system
        .gateway
        .submit(MutationIntent::Create(ProductFields::new("Fideos", 1.5, 85)))
        .await;
    let snapshot = rx.recv().await.unwrap();
    assert_eq!(snapshot.len(), 1);

    // invalid live event: dropped, nothing broadcast
    system
        .gateway
        .submit(MutationIntent::Create(ProductFields::default()))
        .await;
    assert!(rx.try_recv().is_err());

    system.gateway.submit(MutationIntent::Delete(snapshot[0].id)).await;
    assert!(rx.recv().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_restart_recovers_catalog_carts_and_id_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionId::new("restart");

    let (kept, dropped, cart) = {
        let system = start(Arc::new(FileBackend::open(dir.path()).unwrap()));
        let kept = system
            .gateway
            .create_product(ProductFields::new("Fideos", 1.5, 85))
            .await
            .unwrap();
        let dropped = system
            .gateway
            .create_product(ProductFields::new("Arroz", 1.0, 5))
            .await
            .unwrap();
        system.gateway.delete_product(dropped.id).await.unwrap();
        let cart = system.carts.create_cart(&session).await.unwrap();
        system.shutdown().await.unwrap();
        (kept, dropped, cart)
    };

    let system = start(Arc::new(FileBackend::open(dir.path()).unwrap()));
    assert_eq!(system.gateway.catalog().as_slice(), std::slice::from_ref(&kept));
    assert_eq!(system.gateway.product(kept.id), Some(kept.clone()));

    let next = system
        .gateway
        .create_product(ProductFields::new("Yerba", 3.0, 12))
        .await
        .unwrap();
    assert!(next.id > dropped.id);

    // sessions are process-local, the cart record is durable
    assert_eq!(system.carts.current_cart(&session), None);
    let again = system.carts.create_cart(&session).await.unwrap();
    assert_ne!(again.id, cart.id);
    assert_eq!(system.carts.current_cart(&session), Some(again));

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_deleted_ids_are_not_reissued_after_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = {
        let system = start(Arc::new(FileBackend::open(dir.path()).unwrap()));
        let first = system
            .gateway
            .create_product(ProductFields::new("Fideos", 1.5, 85))
            .await
            .unwrap();
        system.gateway.delete_product(first.id).await.unwrap();
        system.shutdown().await.unwrap();
        first
    };

    let system = start(Arc::new(FileBackend::open(dir.path()).unwrap()));
    assert!(system.gateway.catalog().is_empty());
    let next = system
        .gateway
        .create_product(ProductFields::new("Yerba", 3.0, 12))
        .await
        .unwrap();
    assert!(next.id > first.id);

    system.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_startup_fails_cleanly_when_id_space_is_exhausted() {
    let backend = Arc::new(MemoryBackend::new());
    let snapshot = format!(
        r#"[{{"id":{},"title":"Fideos","price":1.5,"img":"sin-imagen.png","stock":85}}]"#,
        u64::MAX
    );
    backend.store("products", snapshot.as_bytes()).unwrap();

    let err = CatalogSystem::start(&ServerConfig::default(), backend).err().unwrap();
    assert!(matches!(err, StoreError::Persistence(ref msg) if msg.contains("exhausted")));
}

#[tokio::test]
async fn test_carts_are_unique_per_request() {
    let system = start(Arc::new(MemoryBackend::new()));
    let alice = SessionId::new("alice");
    let bob = SessionId::new("bob");

    let a = system.carts.create_cart(&alice).await.unwrap();
    let b = system.carts.create_cart(&bob).await.unwrap();

    assert_ne!(a.id, b.id);
    assert!(a.items.is_empty());
    assert_eq!(system.carts.current_cart(&alice), Some(a));
    assert_eq!(system.carts.current_cart(&bob), Some(b));
}
