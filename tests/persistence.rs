//! Catalog state survives a save and a fresh load through the public API.
//!
//! Each test opens a `Catalog` over a `JsonFileStore` in a temp directory,
//! mutates it, then opens a second catalog on the same file and checks what
//! came back.

use photo_catalog::catalog::{Catalog, CatalogError};
use photo_catalog::model::Tag;
use photo_catalog::scan::{self, Seed};
use photo_catalog::search::Query;
use photo_catalog::store::{JsonFileStore, PhotoStore};
use photo_catalog::tags::TagTypeRegistry;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn seeded_store(root: &Path) -> JsonFileStore {
    let stock = root.join("stock");
    fs::create_dir_all(&stock).unwrap();
    for name in ["harbour.jpg", "bridge.png", "market.GIF", "notes.txt"] {
        fs::write(stock.join(name), b"x").unwrap();
    }
    JsonFileStore::new(root.join("data/data.json")).with_seed(Seed {
        username: "stock".into(),
        album: "Stock Album".into(),
        image_dir: stock,
        tag_types: TagTypeRegistry::stock(),
    })
}

fn uri(root: &Path, name: &str) -> String {
    scan::image_uri(&root.join("stock").join(name))
}

#[test]
fn first_run_seeds_stock_user() {
    let tmp = TempDir::new().unwrap();
    let catalog = Catalog::open(seeded_store(tmp.path())).unwrap();

    let stock = catalog.login("stock").unwrap();
    let album = stock.album("Stock Album").unwrap();
    let names: Vec<&str> = album.photos().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["bridge.png", "harbour.jpg", "market.GIF"]);
    assert!(catalog.tag_types().is_restricted("Place"));
}

#[test]
fn mutations_survive_reload() {
    let tmp = TempDir::new().unwrap();
    let harbour = uri(tmp.path(), "harbour.jpg");
    {
        let mut catalog = Catalog::open(seeded_store(tmp.path())).unwrap();
        catalog.create_user("ada").unwrap();
        catalog.create_album("ada", "Trips").unwrap();
        let photo = scan::photo_from_file(&tmp.path().join("stock/harbour.jpg")).unwrap();
        catalog.add_photo("ada", "Trips", photo).unwrap();
        catalog
            .add_tag("ada", "Trips", &harbour, Tag::new("Place", "Oslo"))
            .unwrap();
        catalog.set_caption(&harbour, "Morning ferry").unwrap();
        catalog.register_tag_type("Event", true).unwrap();
    }

    let reopened = Catalog::open(seeded_store(tmp.path())).unwrap();
    let records = reopened.find_by_image_path(&harbour);
    assert_eq!(records.len(), 2);
    for photo in records {
        assert_eq!(photo.caption, "Morning ferry");
        assert_eq!(photo.tags(), &[Tag::new("Place", "Oslo")]);
    }
    assert!(reopened.tag_types().is_restricted("Event"));
    assert_eq!(reopened.users().len(), 2);
}

#[test]
fn seed_is_not_rescanned_once_saved() {
    let tmp = TempDir::new().unwrap();
    {
        let mut catalog = Catalog::open(seeded_store(tmp.path())).unwrap();
        catalog.delete_album("stock", "Stock Album").unwrap();
    }
    let reopened = Catalog::open(seeded_store(tmp.path())).unwrap();
    assert!(reopened.login("stock").unwrap().albums().is_empty());
}

#[test]
fn saved_search_album_round_trips() {
    let tmp = TempDir::new().unwrap();
    let bridge = uri(tmp.path(), "bridge.png");
    {
        let mut catalog = Catalog::open(seeded_store(tmp.path())).unwrap();
        catalog
            .add_tag("stock", "Stock Album", &bridge, Tag::new("Item", "Bridge"))
            .unwrap();
        let count = catalog
            .create_album_from_search("stock", "Bridges", &Query::Tag(Tag::new("item", "bridge")))
            .unwrap();
        assert_eq!(count, 1);
    }
    let reopened = Catalog::open(seeded_store(tmp.path())).unwrap();
    let album = reopened.album("stock", "bridges").unwrap();
    assert_eq!(album.photos()[0].image_path(), bridge);
    assert_eq!(reopened.find_by_image_path(&bridge).len(), 2);
}

#[test]
fn corrupt_snapshot_refuses_to_open() {
    let tmp = TempDir::new().unwrap();
    let store = seeded_store(tmp.path());
    fs::create_dir_all(tmp.path().join("data")).unwrap();
    fs::write(store.path(), "{ not json").unwrap();

    assert!(Catalog::open(&store).is_err());
    let fallback = Catalog::open_or_default(&store);
    assert!(fallback.users().is_empty());
    // Nothing was written over the broken file
    assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
}

#[test]
fn failed_save_reports_persistence_failure() {
    let tmp = TempDir::new().unwrap();
    // A directory where the snapshot file should be makes the rename fail.
    let data = tmp.path().join("data.json");
    fs::create_dir_all(data.join("occupied")).unwrap();
    let store = JsonFileStore::new(&data);
    let mut catalog = Catalog::from_snapshot(&store, Default::default());

    let err = catalog.create_user("ada").unwrap_err();
    assert!(matches!(err, CatalogError::Persistence(_)));
    assert!(catalog.user("ada").is_some());
    assert!(store.load().is_err());
}
