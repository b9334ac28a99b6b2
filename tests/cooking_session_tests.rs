use chrono::Utc;
use scandibox::cooking_session::{CookingSession, CookingState};
use scandibox::kitchen_model::{Category, InventoryItem, NewInventoryItem, Recipe};
use uuid::Uuid;

fn stocked(name: &str, category: Category) -> InventoryItem {
    NewInventoryItem::new(name, category, Utc::now()).into_item(Uuid::new_v4())
}

fn stew() -> Recipe {
    Recipe::new("gen-1-0", "Lapskaus")
        .with_ingredients(&["500g beef", "4 potatoes", "2 carrots"])
        .with_instructions(&["Brown the beef", "Add vegetables", "Simmer for an hour"])
}

fn at_last_step(recipe: Recipe) -> CookingSession {
    let mut session = CookingSession::new(recipe);
    session.start();
    while session.next() {}
    session
}

#[test]
fn test_full_walkthrough_with_confirmation() {
    let beef = stocked("Beef", Category::Meat);
    let carrots = stocked("Carrots", Category::Produce);
    let oats = stocked("Oats", Category::Pantry);

    let mut session = at_last_step(stew());
    assert_eq!(session.current_instruction(), Some("Simmer for an hour"));
    assert!(session.finish(&[beef.clone(), carrots.clone(), oats]));

    match session.state() {
        CookingState::AwaitingDeductionConfirm { candidates } => {
            assert_eq!(candidates.len(), 2);
            assert!(candidates.iter().all(|c| c.selected));
        }
        other => panic!("Unexpected state: {other:?}"),
    }

    assert_eq!(session.toggle(carrots.id), Some(false));
    assert_eq!(session.toggle(carrots.id), Some(true));
    assert_eq!(session.toggle(Uuid::new_v4()), None);

    let confirmed = session.confirm().expect("awaiting confirmation");
    assert_eq!(confirmed.len(), 2);
    assert!(confirmed.contains(&beef.id));
    assert!(session.is_closed());
}

#[test]
fn test_skip_discards_candidates() {
    let mut session = at_last_step(stew());
    session.finish(&[stocked("Potatoes", Category::Produce)]);
    assert_eq!(session.selected_ids().len(), 1);

    assert!(session.skip());
    assert!(session.is_closed());
    assert!(session.selected_ids().is_empty());
    assert_eq!(session.confirm(), None);
}

#[test]
fn test_finish_without_matches_closes_directly() {
    let mut session = at_last_step(stew());
    assert!(session.finish(&[stocked("Yoghurt", Category::Dairy)]));
    assert_eq!(session.state(), &CookingState::Closed);
}

#[test]
fn test_exit_from_every_state() {
    let mut not_started = CookingSession::new(stew());
    not_started.exit();
    assert!(not_started.is_closed());

    let mut stepping = CookingSession::new(stew());
    stepping.start();
    stepping.exit();
    assert!(stepping.is_closed());

    let mut awaiting = at_last_step(stew());
    awaiting.finish(&[stocked("Beef", Category::Meat)]);
    awaiting.exit();
    assert!(awaiting.is_closed());
    assert!(awaiting.selected_ids().is_empty());
}

#[test]
fn test_closed_session_ignores_commands() {
    let mut session = at_last_step(stew());
    session.exit();
    assert!(!session.start());
    assert!(!session.next());
    assert!(!session.previous());
    assert!(!session.finish(&[]));
    assert!(!session.skip());
    assert!(session.is_closed());
}
