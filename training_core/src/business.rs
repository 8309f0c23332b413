//! Businesses: purchase, time-based accrual, claims and upgrades.
//!
//! Accrual is evaluated lazily. Nothing ticks in the background; the
//! number of claimable cycles is a pure function of `now` and
//! `last_claim_at`, capped by the business's claim storage. Claiming
//! drains every available cycle and restarts the window at `now`, so any
//! partial cycle and any time spent at the cap are forfeited.
//!
//! Two currencies are kept apart: businesses are bought with player gold,
//! upgrades are paid from the business's own money.

use crate::{
    generate_id, BusinessDefinition, Catalog, Outcome, OwnedBusiness, PlayerState, Rejected,
    UpgradeDefinition, UpgradeEffect,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Per-cycle yield of a business after upgrades
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Yields {
    pub xp: u64,
    pub money: u64,
}

/// Result of an accepted claim
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Claim {
    pub instance_id: String,
    pub cycles: u32,
    pub xp_gained: u64,
    pub money_gained: u64,
    pub business_level: u32,
}

/// Result of an accepted upgrade purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpgradePurchase {
    pub instance_id: String,
    pub upgrade_id: String,
    pub cost: u64,
    pub new_level: u32,
}

fn cycle_duration_ms(def: &BusinessDefinition) -> f64 {
    def.cycle_duration_hours * MS_PER_HOUR
}

fn elapsed_ms(instance: &OwnedBusiness, now: DateTime<Utc>) -> i64 {
    // A clock that moved backwards yields no cycles rather than negative ones
    (now - instance.last_claim_at).num_milliseconds().max(0)
}

/// Maximum number of cycles the business can hold before claiming
pub fn effective_max_claims(instance: &OwnedBusiness, def: &BusinessDefinition) -> u32 {
    def.upgrades
        .iter()
        .filter_map(|upg| match upg.effect {
            UpgradeEffect::ClaimStorage {
                claim_storage_bonus,
            } => Some(claim_storage_bonus.saturating_mul(instance.upgrade_level(&upg.id))),
            UpgradeEffect::Boost { .. } => None,
        })
        .fold(def.base_max_claims, |max, bonus| max.saturating_add(bonus))
}

/// Cycles completed since the last claim, capped by claim storage
pub fn get_available_cycles(
    instance: &OwnedBusiness,
    def: &BusinessDefinition,
    now: DateTime<Utc>,
) -> u32 {
    let raw = (elapsed_ms(instance, now) as f64 / cycle_duration_ms(def)).floor();
    let max = effective_max_claims(instance, def);
    if raw >= f64::from(max) {
        max
    } else {
        raw as u32
    }
}

/// When the cycle currently in progress completes
///
/// Pure; intended for countdown displays that refresh on a timer.
pub fn next_cycle_at(
    instance: &OwnedBusiness,
    def: &BusinessDefinition,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    let cycle_ms = cycle_duration_ms(def);
    let cycles_so_far = (elapsed_ms(instance, now) as f64 / cycle_ms).floor();
    let offset_ms = ((cycles_so_far + 1.0) * cycle_ms) as i64;
    instance.last_claim_at + Duration::milliseconds(offset_ms)
}

/// Per-cycle XP and money after boost upgrades
///
/// Boosts add to a base multiplier of 1; XP and money multipliers are
/// independent and never compound with each other.
pub fn per_cycle_yields(instance: &OwnedBusiness, def: &BusinessDefinition) -> Yields {
    let mut xp_mult = 1.0;
    let mut money_mult = 1.0;

    for upg in &def.upgrades {
        if let UpgradeEffect::Boost {
            xp_boost_per_level,
            money_boost_per_level,
        } = upg.effect
        {
            let level = f64::from(instance.upgrade_level(&upg.id));
            xp_mult += xp_boost_per_level * level;
            money_mult += money_boost_per_level * level;
        }
    }

    Yields {
        xp: (def.base_xp_per_cycle as f64 * xp_mult).floor() as u64,
        money: (def.base_money_per_cycle as f64 * money_mult).floor() as u64,
    }
}

/// Business level derived from accumulated business XP
pub fn get_business_level(instance: &OwnedBusiness, def: &BusinessDefinition) -> u32 {
    u32::try_from(instance.business_xp / def.xp_per_business_level.max(1)).unwrap_or(u32::MAX)
}

/// Cost of buying the next level of an upgrade currently at `current_level`
pub fn upgrade_cost(upgrade: &UpgradeDefinition, current_level: u32) -> u64 {
    let exponent = i32::try_from(current_level).unwrap_or(i32::MAX);
    (upgrade.base_cost as f64 * upgrade.cost_multiplier.powi(exponent)).ceil() as u64
}

/// Businesses the player may buy at `player_level` and does not own yet
pub fn check_unlocks<'a>(
    state: &PlayerState,
    catalog: &'a Catalog,
    player_level: u32,
) -> Vec<&'a BusinessDefinition> {
    catalog
        .businesses
        .iter()
        .filter(|def| player_level >= def.unlock_level && !state.owns_business(&def.id))
        .collect()
}

/// Total business money across all owned businesses
pub fn total_business_money(state: &PlayerState) -> u64 {
    state.businesses.iter().map(|b| b.business_money).sum()
}

/// Resolve an owned instance and its catalog definition
fn resolve<'a>(
    state: &PlayerState,
    catalog: &'a Catalog,
    instance_id: &str,
) -> Outcome<(usize, &'a BusinessDefinition)> {
    let index = state
        .businesses
        .iter()
        .position(|b| b.instance_id == instance_id)
        .ok_or_else(|| Rejected::UnknownInstance(instance_id.to_string()))?;
    let def_id = &state.businesses[index].def_id;
    let def = catalog
        .business(def_id)
        .ok_or_else(|| Rejected::UnknownBusiness(def_id.clone()))?;
    Ok((index, def))
}

/// Buy a business with player gold
///
/// Each definition can be owned once. The accrual window starts at `now`.
pub fn purchase_business(
    state: &mut PlayerState,
    catalog: &Catalog,
    def_id: &str,
    now: DateTime<Utc>,
) -> Outcome<OwnedBusiness> {
    let def = catalog
        .business(def_id)
        .ok_or_else(|| Rejected::UnknownBusiness(def_id.to_string()))?;

    if state.owns_business(def_id) {
        return Err(Rejected::AlreadyOwned(def_id.to_string()));
    }
    if state.level() < def.unlock_level {
        return Err(Rejected::BusinessLocked {
            def_id: def_id.to_string(),
            unlock_level: def.unlock_level,
        });
    }
    if state.gold < def.base_cost {
        return Err(Rejected::InsufficientGold {
            needed: def.base_cost,
            available: state.gold,
        });
    }

    state.gold -= def.base_cost;
    let instance = OwnedBusiness {
        instance_id: generate_id("biz"),
        def_id: def.id.clone(),
        purchased_at: now,
        gold_invested: def.base_cost,
        business_xp: 0,
        business_level: 0,
        business_money: 0,
        last_claim_at: now,
        upgrades: Default::default(),
    };
    state.businesses.push(instance.clone());

    tracing::info!("Purchased {} for {} gold", def.name, def.base_cost);
    Ok(instance)
}

/// Convert every available cycle into business XP and money
///
/// Resets the accrual window to `now`.
pub fn claim_interest(
    state: &mut PlayerState,
    catalog: &Catalog,
    instance_id: &str,
    now: DateTime<Utc>,
) -> Outcome<Claim> {
    let (index, def) = resolve(state, catalog, instance_id)?;
    let instance = &mut state.businesses[index];

    let cycles = get_available_cycles(instance, def, now);
    if cycles == 0 {
        tracing::debug!("Nothing to claim on {}", instance_id);
        return Err(Rejected::NoCyclesReady(instance_id.to_string()));
    }

    let yields = per_cycle_yields(instance, def);
    let xp_gained = u64::from(cycles) * yields.xp;
    let money_gained = u64::from(cycles) * yields.money;

    instance.business_xp += xp_gained;
    instance.business_money += money_gained;
    instance.last_claim_at = now;
    instance.business_level = get_business_level(instance, def);

    tracing::info!(
        "Claimed {} cycles on {}: +{} money, +{} business XP",
        cycles,
        def.name,
        money_gained,
        xp_gained
    );

    Ok(Claim {
        instance_id: instance_id.to_string(),
        cycles,
        xp_gained,
        money_gained,
        business_level: instance.business_level,
    })
}

/// Buy the next level of an upgrade with business money
///
/// Requires the upgrade to be below its max level, enough business money,
/// and a player level of at least the upgrade's requirement.
pub fn purchase_upgrade(
    state: &mut PlayerState,
    catalog: &Catalog,
    instance_id: &str,
    upgrade_id: &str,
    player_level: u32,
) -> Outcome<UpgradePurchase> {
    let (index, def) = resolve(state, catalog, instance_id)?;
    let upg = def
        .upgrade(upgrade_id)
        .ok_or_else(|| Rejected::UnknownUpgrade(upgrade_id.to_string()))?;
    let instance = &mut state.businesses[index];

    let current_level = instance.upgrade_level(upgrade_id);
    if current_level >= upg.max_level {
        return Err(Rejected::UpgradeMaxed {
            upgrade_id: upgrade_id.to_string(),
            max_level: upg.max_level,
        });
    }

    let cost = upgrade_cost(upg, current_level);
    if instance.business_money < cost {
        return Err(Rejected::InsufficientBusinessMoney {
            needed: cost,
            available: instance.business_money,
        });
    }
    if player_level < upg.level_req_base {
        return Err(Rejected::LevelRequirement {
            required: upg.level_req_base,
            current: player_level,
        });
    }

    instance.business_money -= cost;
    let new_level = current_level + 1;
    instance.upgrades.insert(upgrade_id.to_string(), new_level);

    tracing::info!("{} upgraded to level {} for {}", upg.name, new_level, cost);

    Ok(UpgradePurchase {
        instance_id: instance_id.to_string(),
        upgrade_id: upgrade_id.to_string(),
        cost,
        new_level,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_default_catalog;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 0, 0, 0).unwrap()
    }

    fn kiosk() -> BusinessDefinition {
        BusinessDefinition {
            id: "kiosk".into(),
            name: "Kiosk".into(),
            icon: String::new(),
            base_cost: 100,
            base_xp_per_cycle: 10,
            base_money_per_cycle: 20,
            cycle_duration_hours: 8.0,
            base_max_claims: 5,
            unlock_level: 0,
            xp_per_business_level: 100,
            upgrades: vec![
                UpgradeDefinition {
                    id: "sign".into(),
                    name: "Sign".into(),
                    description: String::new(),
                    effect: UpgradeEffect::Boost {
                        xp_boost_per_level: 0.5,
                        money_boost_per_level: 0.25,
                    },
                    base_cost: 30,
                    cost_multiplier: 1.5,
                    max_level: 3,
                    level_req_base: 2,
                },
                UpgradeDefinition {
                    id: "shelf".into(),
                    name: "Shelf".into(),
                    description: String::new(),
                    effect: UpgradeEffect::ClaimStorage {
                        claim_storage_bonus: 2,
                    },
                    base_cost: 10,
                    cost_multiplier: 2.0,
                    max_level: 2,
                    level_req_base: 0,
                },
            ],
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            activities: vec![],
            businesses: vec![kiosk()],
        }
    }

    fn owned(last_claim_at: DateTime<Utc>) -> OwnedBusiness {
        OwnedBusiness {
            instance_id: "biz_1".into(),
            def_id: "kiosk".into(),
            purchased_at: last_claim_at,
            gold_invested: 100,
            business_xp: 0,
            business_level: 0,
            business_money: 0,
            last_claim_at,
            upgrades: Default::default(),
        }
    }

    fn state_owning(instance: OwnedBusiness) -> PlayerState {
        let mut state = PlayerState::default();
        state.businesses.push(instance);
        state
    }

    #[test]
    fn test_cycles_accrue_and_cap() {
        let def = kiosk();
        let biz = owned(t0());

        assert_eq!(get_available_cycles(&biz, &def, t0()), 0);
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(7)), 0);
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(8)), 1);
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(17)), 2);
        // 100h / 8h = 12 raw cycles, capped at 5
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(100)), 5);
    }

    #[test]
    fn test_clock_going_backwards_yields_nothing() {
        let def = kiosk();
        let biz = owned(t0());
        assert_eq!(get_available_cycles(&biz, &def, t0() - Duration::hours(30)), 0);
    }

    #[test]
    fn test_claim_storage_raises_cap() {
        let def = kiosk();
        let mut biz = owned(t0());
        biz.upgrades.insert("shelf".into(), 2);

        assert_eq!(effective_max_claims(&biz, &def), 9);
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(100)), 9);
    }

    #[test]
    fn test_claim_storage_saturates() {
        let mut def = kiosk();
        if let UpgradeEffect::ClaimStorage {
            claim_storage_bonus,
        } = &mut def.upgrades[1].effect
        {
            *claim_storage_bonus = u32::MAX;
        }
        let mut biz = owned(t0());
        biz.upgrades.insert("shelf".into(), 2);

        assert_eq!(effective_max_claims(&biz, &def), u32::MAX);
        assert_eq!(get_available_cycles(&biz, &def, t0() + Duration::hours(100)), 12);
    }

    #[test]
    fn test_boosts_are_additive() {
        let def = kiosk();
        let mut biz = owned(t0());
        assert_eq!(per_cycle_yields(&biz, &def), Yields { xp: 10, money: 20 });

        biz.upgrades.insert("sign".into(), 2);
        // xp: 10 * (1 + 0.5*2) = 20, money: 20 * (1 + 0.25*2) = 30
        assert_eq!(per_cycle_yields(&biz, &def), Yields { xp: 20, money: 30 });

        // Claim storage upgrades do not touch yields
        biz.upgrades.insert("shelf".into(), 1);
        assert_eq!(per_cycle_yields(&biz, &def), Yields { xp: 20, money: 30 });
    }

    #[test]
    fn test_next_cycle_at() {
        let def = kiosk();
        let biz = owned(t0());
        assert_eq!(next_cycle_at(&biz, &def, t0()), t0() + Duration::hours(8));
        assert_eq!(
            next_cycle_at(&biz, &def, t0() + Duration::hours(9)),
            t0() + Duration::hours(16)
        );
    }

    #[test]
    fn test_upgrade_cost_is_geometric() {
        let def = kiosk();
        let sign = def.upgrade("sign").unwrap();
        assert_eq!(upgrade_cost(sign, 0), 30);
        assert_eq!(upgrade_cost(sign, 1), 45);
        assert_eq!(upgrade_cost(sign, 2), 68);
    }

    #[test]
    fn test_claim_drains_and_resets_window() {
        let catalog = catalog();
        let mut state = state_owning(owned(t0()));
        let now = t0() + Duration::hours(20);

        let claim = claim_interest(&mut state, &catalog, "biz_1", now).unwrap();
        assert_eq!(claim.cycles, 2);
        assert_eq!(claim.xp_gained, 20);
        assert_eq!(claim.money_gained, 40);

        let biz = &state.businesses[0];
        assert_eq!(biz.last_claim_at, now);
        assert_eq!(biz.business_money, 40);
        // The 4 hours toward a third cycle are gone
        assert_eq!(get_available_cycles(biz, &kiosk(), now), 0);
        assert_eq!(
            claim_interest(&mut state, &catalog, "biz_1", now),
            Err(Rejected::NoCyclesReady("biz_1".into()))
        );
    }

    #[test]
    fn test_claim_updates_business_level() {
        let catalog = catalog();
        let mut biz = owned(t0());
        biz.business_xp = 95;
        let mut state = state_owning(biz);

        let claim =
            claim_interest(&mut state, &catalog, "biz_1", t0() + Duration::hours(8)).unwrap();
        assert_eq!(claim.business_level, 1);
        assert_eq!(state.businesses[0].business_level, 1);
    }

    #[test]
    fn test_purchase_business() {
        let catalog = catalog();
        let mut state = PlayerState::default();
        state.gold = 150;

        let biz = purchase_business(&mut state, &catalog, "kiosk", t0()).unwrap();
        assert_eq!(state.gold, 50);
        assert_eq!(biz.last_claim_at, t0());
        assert_eq!(biz.gold_invested, 100);
        assert!(biz.upgrades.is_empty());
        assert!(biz.instance_id.starts_with("biz_"));

        state.gold = 1000;
        assert_eq!(
            purchase_business(&mut state, &catalog, "kiosk", t0()),
            Err(Rejected::AlreadyOwned("kiosk".into()))
        );
        assert_eq!(state.gold, 1000);
        assert_eq!(state.businesses.len(), 1);
    }

    #[test]
    fn test_purchase_business_rejections() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();
        state.gold = 10;

        assert_eq!(
            purchase_business(&mut state, &catalog, "lemonade_stand", t0()),
            Err(Rejected::InsufficientGold {
                needed: 50,
                available: 10
            })
        );

        state.gold = 10_000;
        assert_eq!(
            purchase_business(&mut state, &catalog, "bakery", t0()),
            Err(Rejected::BusinessLocked {
                def_id: "bakery".into(),
                unlock_level: 3
            })
        );
        assert_eq!(
            purchase_business(&mut state, &catalog, "casino", t0()),
            Err(Rejected::UnknownBusiness("casino".into()))
        );
        assert!(state.businesses.is_empty());
        assert_eq!(state.gold, 10_000);
    }

    #[test]
    fn test_upgrade_requires_money_and_level() {
        let catalog = catalog();
        let mut biz = owned(t0());
        biz.business_money = 29;
        let mut state = state_owning(biz);

        // Enough level, not enough money
        assert_eq!(
            purchase_upgrade(&mut state, &catalog, "biz_1", "sign", 5),
            Err(Rejected::InsufficientBusinessMoney {
                needed: 30,
                available: 29
            })
        );

        // Enough money, not enough level
        state.businesses[0].business_money = 500;
        assert_eq!(
            purchase_upgrade(&mut state, &catalog, "biz_1", "sign", 1),
            Err(Rejected::LevelRequirement {
                required: 2,
                current: 1
            })
        );
        assert_eq!(state.businesses[0].business_money, 500);
        assert_eq!(state.businesses[0].upgrade_level("sign"), 0);

        // Both gates satisfied
        let bought = purchase_upgrade(&mut state, &catalog, "biz_1", "sign", 2).unwrap();
        assert_eq!(bought.cost, 30);
        assert_eq!(bought.new_level, 1);
        assert_eq!(state.businesses[0].business_money, 470);
        // Player gold is never touched by upgrades
        assert_eq!(state.gold, 0);
    }

    #[test]
    fn test_upgrade_stops_at_max_level() {
        let catalog = catalog();
        let mut biz = owned(t0());
        biz.business_money = 1000;
        let mut state = state_owning(biz);

        let first = purchase_upgrade(&mut state, &catalog, "biz_1", "shelf", 0).unwrap();
        let second = purchase_upgrade(&mut state, &catalog, "biz_1", "shelf", 0).unwrap();
        assert_eq!((first.cost, second.cost), (10, 20));

        assert_eq!(
            purchase_upgrade(&mut state, &catalog, "biz_1", "shelf", 0),
            Err(Rejected::UpgradeMaxed {
                upgrade_id: "shelf".into(),
                max_level: 2
            })
        );
        assert_eq!(state.businesses[0].business_money, 970);
        assert_eq!(
            purchase_upgrade(&mut state, &catalog, "biz_1", "golden_till", 0),
            Err(Rejected::UnknownUpgrade("golden_till".into()))
        );
    }

    #[test]
    fn test_check_unlocks_excludes_owned() {
        let catalog = build_default_catalog();
        let mut state = PlayerState::default();

        let ids: Vec<_> = check_unlocks(&state, &catalog, 3)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["lemonade_stand", "bakery"]);

        state.gold = 50;
        purchase_business(&mut state, &catalog, "lemonade_stand", t0()).unwrap();
        let ids: Vec<_> = check_unlocks(&state, &catalog, 3)
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["bakery"]);
    }

    #[test]
    fn test_total_business_money() {
        let mut a = owned(t0());
        a.business_money = 12;
        let mut b = owned(t0());
        b.instance_id = "biz_2".into();
        b.business_money = 30;
        let mut state = state_owning(a);
        state.businesses.push(b);
        assert_eq!(total_business_money(&state), 42);
    }
}
