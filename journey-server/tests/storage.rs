use chrono::NaiveDate;
use journey_server::storage::seed::{CatalogSeed, GameSeed, MissionSeed};
use journey_server::storage::{NewAccountRow, StorageError, Store};

async fn store_with_catalog(dir: &tempfile::TempDir) -> Store {
    let db = dir.path().join("ledger.db");
    let store = Store::connect_sqlite(db.to_str().unwrap()).await.unwrap();
    let seed = CatalogSeed {
        missions: vec![MissionSeed {
            title: "Daily stand-up".into(),
            description: "Join the team call".into(),
            reward_points: 50,
            category: None,
            difficulty: None,
        }],
        games: vec![GameSeed {
            title: "Trivia".into(),
            description: None,
            genre: None,
            difficulty_level: None,
            reward_points: 15,
            image_url: None,
            status: Default::default(),
        }],
        ..Default::default()
    };
    store.seed_catalog(&seed).await.unwrap();
    // Seeding twice must not duplicate rows
    store.seed_catalog(&seed).await.unwrap();
    store
}

async fn new_user(store: &Store, email: &str) -> i32 {
    store
        .create_user(NewAccountRow {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "x".into(),
            age: 30,
        })
        .await
        .unwrap()
        .id
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

#[tokio::test]
async fn missions_reset_daily_and_ledger_matches_total() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_catalog(&dir).await;
    let user = new_user(&store, "ada@example.com").await;

    let missions = store.list_missions().await.unwrap();
    assert_eq!(missions.len(), 1);
    let mission = missions[0].id;

    let first = store.complete_mission(user, mission, day(1)).await.unwrap();
    assert_eq!(first.user_total_points, 50);
    assert!(!store.mission_available(user, mission, day(1)).await.unwrap());

    let again = store.complete_mission(user, mission, day(1)).await;
    assert!(matches!(again, Err(StorageError::Conflict(_))));

    assert!(store.mission_available(user, mission, day(2)).await.unwrap());
    let next = store.complete_mission(user, mission, day(2)).await.unwrap();
    assert_eq!(next.user_total_points, 100);

    let game = store.list_active_games().await.unwrap()[0].id;
    store.complete_game(user, game).await.unwrap();
    let played = store.complete_game(user, game).await.unwrap();
    assert_eq!(played.user_total_points, 130);

    let total = store.get_user(user).await.unwrap().unwrap().total_points;
    assert_eq!(total, 130);
    assert_eq!(store.ledger_sum(user).await.unwrap(), i64::from(total));
    assert_eq!(store.mission_history(user).await.unwrap().len(), 2);
}

#[tokio::test]
async fn unknown_mission_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_catalog(&dir).await;
    let user = new_user(&store, "ada@example.com").await;
    let res = store.complete_mission(user, 4242, day(1)).await;
    assert!(matches!(res, Err(StorageError::NotFound(_))));
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_catalog(&dir).await;
    new_user(&store, "ada@example.com").await;
    let dup = store
        .create_user(NewAccountRow {
            name: "Other".into(),
            email: "ada@example.com".into(),
            password_hash: "y".into(),
            age: 40,
        })
        .await;
    assert!(matches!(dup, Err(StorageError::Conflict(_))));
}

#[tokio::test]
async fn deleting_a_user_removes_their_rows() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_catalog(&dir).await;
    let ada = new_user(&store, "ada@example.com").await;
    let bob = new_user(&store, "bob@example.com").await;
    let mission = store.list_missions().await.unwrap()[0].id;
    store.complete_mission(ada, mission, day(1)).await.unwrap();
    store.request_friend(ada, bob).await.unwrap();
    store.accept_friend(bob, ada).await.unwrap();
    assert_eq!(store.list_friends(bob).await.unwrap().len(), 1);

    assert!(store.delete_user(ada).await.unwrap());
    assert!(!store.delete_user(ada).await.unwrap());
    assert!(store.get_user(ada).await.unwrap().is_none());
    assert!(store.list_friends(bob).await.unwrap().is_empty());
    assert_eq!(store.ledger_sum(ada).await.unwrap(), 0);
}

#[tokio::test]
async fn repeat_plays_count_one_unique_player() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_with_catalog(&dir).await;
    let ada = new_user(&store, "ada@example.com").await;
    let bob = new_user(&store, "bob@example.com").await;
    let game = store.list_active_games().await.unwrap()[0].id;

    store.complete_game(ada, game).await.unwrap();
    store.complete_game(ada, game).await.unwrap();
    store.complete_game(bob, game).await.unwrap();

    let stats = store.game_stats(game).await.unwrap();
    assert_eq!(stats.total_completions, 3);
    assert_eq!(stats.unique_players, 2);
    assert_eq!(stats.total_rewards_distributed, 45);
}
