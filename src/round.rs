//! Round controller: the boundary between the game loop and the ledger
//!
//! A paid round only starts after the entry fee is confirmed. When the loop
//! reports a terminal outcome the controller reports it to the ledger at most
//! once, then refreshes the player's stats. Ledger calls are async and never
//! block the frame loop; the host spawns the returned futures.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::game_loop::RoundSummary;
use crate::sim::RoundOutcome;

/// Decimals of the ledger's native token
const WEI_DECIMALS: usize = 18;

/// An amount in the ledger's smallest unit.
///
/// Serialized as a decimal string since amounts overflow JSON numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Wei(pub u128);

impl fmt::Display for Wei {
    /// Whole-token display with trailing zeros trimmed: `1.5`, `0.01`, `2.0`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = 10u128.pow(WEI_DECIMALS as u32);
        let whole = self.0 / unit;
        let frac = format!("{:0width$}", self.0 % unit, width = WEI_DECIMALS);
        let frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            write!(f, "{whole}.0")
        } else {
            write!(f, "{whole}.{frac}")
        }
    }
}

impl TryFrom<String> for Wei {
    type Error = std::num::ParseIntError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.trim().parse().map(Wei)
    }
}

impl From<Wei> for String {
    fn from(w: Wei) -> Self {
        w.0.to_string()
    }
}

/// Per-player numbers kept by the ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub wins: u64,
    pub games_played: u64,
    pub total_earnings: Wei,
    /// A paid round is open on the ledger; no new one may start
    pub has_active_game: bool,
}

/// How the current round was started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayMode {
    /// No round started yet
    #[default]
    Idle,
    Paid,
    /// Never reported to the ledger
    FreePlay,
}

/// Ledger failures, worded for the player
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("You already have an active game. Please finish your current game first.")]
    ActiveGame,

    #[error("Insufficient balance. You need {needed} but only have {available}.")]
    InsufficientBalance { needed: Wei, available: Wei },

    #[error("Contract rejected the transaction. You might already have an active game or the contract balance is too low.")]
    ContractRejected,

    #[error("Insufficient balance to pay the entry fee and gas costs.")]
    InsufficientFunds,

    #[error("Transaction was rejected by user.")]
    UserRejected,

    #[error("Transaction failed")]
    TransactionFailed,

    #[error("A transaction is already pending. Please wait for it to confirm.")]
    Pending,

    #[error("{0}")]
    Provider(String),
}

impl LedgerError {
    /// Classify a raw provider/wallet error message
    pub fn from_provider_message(message: &str) -> Self {
        if message.contains("require(false)") {
            LedgerError::ContractRejected
        } else if message.contains("insufficient funds") {
            LedgerError::InsufficientFunds
        } else if message.contains("user rejected") {
            LedgerError::UserRejected
        } else {
            LedgerError::Provider(message.to_string())
        }
    }
}

/// Calls the controller needs from the ledger.
///
/// Transaction methods resolve once the transaction is confirmed.
#[allow(async_fn_in_trait)]
pub trait LedgerClient {
    async fn entry_fee(&self) -> Result<Wei, LedgerError>;
    async fn win_reward(&self) -> Result<Wei, LedgerError>;
    /// Connected wallet balance
    async fn balance(&self) -> Result<Wei, LedgerError>;
    async fn start_round(&self, entry_fee: Wei) -> Result<(), LedgerError>;
    async fn report_win(&self) -> Result<(), LedgerError>;
    async fn report_loss(&self) -> Result<(), LedgerError>;
    async fn player_stats(&self) -> Result<PlayerStats, LedgerError>;
}

#[derive(Debug, Default)]
struct Shared {
    stats: PlayerStats,
    entry_fee: Wei,
    win_reward: Wei,
    mode: PlayMode,
    /// Outcome of the current paid round already handed to the ledger
    settled: bool,
    busy: bool,
    last_error: Option<LedgerError>,
}

/// Round controller. Cheap to clone; clones share state.
pub struct RoundController<L> {
    ledger: Rc<L>,
    shared: Rc<RefCell<Shared>>,
}

impl<L> Clone for RoundController<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: Rc::clone(&self.ledger),
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<L: LedgerClient> RoundController<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Rc::new(ledger),
            shared: Rc::new(RefCell::new(Shared::default())),
        }
    }

    pub fn stats(&self) -> PlayerStats {
        self.shared.borrow().stats.clone()
    }

    pub fn entry_fee(&self) -> Wei {
        self.shared.borrow().entry_fee
    }

    pub fn win_reward(&self) -> Wei {
        self.shared.borrow().win_reward
    }

    pub fn mode(&self) -> PlayMode {
        self.shared.borrow().mode
    }

    /// A ledger call is in flight
    pub fn is_busy(&self) -> bool {
        self.shared.borrow().busy
    }

    pub fn last_error(&self) -> Option<LedgerError> {
        self.shared.borrow().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.shared.borrow_mut().last_error = None;
    }

    /// Whether a paid round may start now
    pub fn can_start_paid(&self) -> bool {
        let shared = self.shared.borrow();
        !shared.busy && !shared.stats.has_active_game && !Self::unsettled(&shared)
    }

    fn unsettled(shared: &Shared) -> bool {
        shared.mode == PlayMode::Paid && !shared.settled
    }

    fn record<T>(&self, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
        if let Err(e) = &result {
            log::warn!("Ledger call failed: {}", e);
            self.shared.borrow_mut().last_error = Some(e.clone());
        }
        result
    }

    /// Load fee, reward and stats after the wallet connects
    pub async fn connect(&self) -> Result<(), LedgerError> {
        let result: Result<(), LedgerError> = async {
            let fee = self.ledger.entry_fee().await?;
            let reward = self.ledger.win_reward().await?;
            {
                let mut shared = self.shared.borrow_mut();
                shared.entry_fee = fee;
                shared.win_reward = reward;
            }
            log::info!("Entry fee {}, win reward {}", fee, reward);
            self.refresh_stats().await.map(|_| ())
        }
        .await;
        self.record(result)
    }

    pub async fn refresh_stats(&self) -> Result<PlayerStats, LedgerError> {
        let stats = self.ledger.player_stats().await?;
        log::debug!("Stats: {:?}", stats);
        self.shared.borrow_mut().stats = stats.clone();
        Ok(stats)
    }

    /// Refuse a new round while a transaction is pending, then run the
    /// paid-round gate
    fn claim_paid_start(&self) -> Result<(), LedgerError> {
        let mut shared = self.shared.borrow_mut();
        let refused = if shared.busy {
            Some(LedgerError::Pending)
        } else if shared.stats.has_active_game || Self::unsettled(&shared) {
            Some(LedgerError::ActiveGame)
        } else {
            None
        };
        if let Some(e) = refused {
            shared.last_error = Some(e.clone());
            return Err(e);
        }
        shared.busy = true;
        shared.last_error = None;
        Ok(())
    }

    /// Pay the entry fee. The loop may start only once this resolves `Ok`.
    ///
    /// The controller is busy from the moment this is called, before the
    /// returned future is first polled.
    pub fn begin_paid_round(&self) -> impl Future<Output = Result<(), LedgerError>> + use<L>
    where
        L: 'static,
    {
        let claimed = self.claim_paid_start();
        let controller = self.clone();
        async move {
            claimed?;
            let result: Result<(), LedgerError> = async {
                let fee = controller.ledger.entry_fee().await?;
                let balance = controller.ledger.balance().await?;
                if balance < fee {
                    return Err(LedgerError::InsufficientBalance {
                        needed: fee,
                        available: balance,
                    });
                }
                controller.ledger.start_round(fee).await?;
                log::info!("Entry fee {} paid", fee);
                {
                    let mut shared = controller.shared.borrow_mut();
                    shared.entry_fee = fee;
                    shared.mode = PlayMode::Paid;
                    shared.settled = false;
                }
                if let Err(e) = controller.refresh_stats().await {
                    log::warn!("Stats refresh after start failed: {}", e);
                }
                Ok(())
            }
            .await;

            controller.shared.borrow_mut().busy = false;
            controller.record(result)
        }
    }

    /// Start a round that never touches the ledger.
    ///
    /// Refused while an entry fee is pending.
    pub fn begin_free_play(&self) -> Result<(), LedgerError> {
        let mut shared = self.shared.borrow_mut();
        if shared.busy {
            shared.last_error = Some(LedgerError::Pending);
            return Err(LedgerError::Pending);
        }
        if Self::unsettled(&shared) {
            log::warn!("Free play started over an unsettled paid round");
        }
        shared.mode = PlayMode::FreePlay;
        shared.last_error = None;
        Ok(())
    }

    /// Hand a terminal outcome to the ledger.
    ///
    /// Returns the report future the first time it is called for a paid
    /// round and `None` afterwards, for free play, and for non-terminal
    /// outcomes. The round counts as settled as soon as this returns.
    pub fn settle(
        &self,
        summary: &RoundSummary,
    ) -> Option<impl Future<Output = Result<(), LedgerError>> + use<L>>
    where
        L: 'static,
    {
        let won = match summary.outcome {
            RoundOutcome::Win => true,
            RoundOutcome::LoseGame => false,
            other => {
                log::warn!("Not settling non-terminal outcome {:?}", other);
                return None;
            }
        };
        {
            let mut shared = self.shared.borrow_mut();
            if shared.mode != PlayMode::Paid || shared.settled {
                return None;
            }
            shared.settled = true;
        }
        log::info!(
            "Reporting {} (score {})",
            if won { "win" } else { "loss" },
            summary.score
        );

        let controller = self.clone();
        Some(async move {
            let reported = if won {
                controller.ledger.report_win().await
            } else {
                controller.ledger.report_loss().await
            };
            controller.record(reported)?;
            if let Err(e) = controller.refresh_stats().await {
                log::warn!("Stats refresh after report failed: {}", e);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::future::poll_fn;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::executor::block_on;
    use futures::task::noop_waker_ref;
    use glam::Vec2;

    use super::*;
    use crate::consts::FIELD_HEIGHT;
    use crate::game_loop::{FrameStep, GameLoop};
    use crate::renderer::HeadlessRenderer;
    use crate::settings::Settings;

    const ETHER: u128 = 1_000_000_000_000_000_000;

    #[derive(Default)]
    struct MockLedger {
        calls: RefCell<Vec<&'static str>>,
        fee: Wei,
        balance: Wei,
        stats: RefCell<PlayerStats>,
        fail_start: Option<LedgerError>,
        fail_report: Option<LedgerError>,
        /// Keeps `start_round` pending until cleared
        hold_start: Cell<bool>,
    }

    impl MockLedger {
        fn funded() -> Self {
            Self {
                fee: Wei(ETHER / 100),
                balance: Wei(ETHER),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.borrow().clone()
        }

        fn count(&self, name: &str) -> usize {
            self.calls.borrow().iter().filter(|c| **c == name).count()
        }
    }

    impl LedgerClient for MockLedger {
        async fn entry_fee(&self) -> Result<Wei, LedgerError> {
            self.calls.borrow_mut().push("entry_fee");
            Ok(self.fee)
        }

        async fn win_reward(&self) -> Result<Wei, LedgerError> {
            self.calls.borrow_mut().push("win_reward");
            Ok(Wei(self.fee.0 * 2))
        }

        async fn balance(&self) -> Result<Wei, LedgerError> {
            self.calls.borrow_mut().push("balance");
            Ok(self.balance)
        }

        async fn start_round(&self, _entry_fee: Wei) -> Result<(), LedgerError> {
            self.calls.borrow_mut().push("start_round");
            poll_fn(|_| {
                if self.hold_start.get() {
                    Poll::Pending
                } else {
                    Poll::Ready(())
                }
            })
            .await;
            if let Some(e) = &self.fail_start {
                return Err(e.clone());
            }
            let mut stats = self.stats.borrow_mut();
            stats.games_played += 1;
            stats.has_active_game = true;
            Ok(())
        }

        async fn report_win(&self) -> Result<(), LedgerError> {
            self.calls.borrow_mut().push("report_win");
            if let Some(e) = &self.fail_report {
                return Err(e.clone());
            }
            let mut stats = self.stats.borrow_mut();
            stats.wins += 1;
            stats.total_earnings = Wei(stats.total_earnings.0 + self.fee.0 * 2);
            stats.has_active_game = false;
            Ok(())
        }

        async fn report_loss(&self) -> Result<(), LedgerError> {
            self.calls.borrow_mut().push("report_loss");
            if let Some(e) = &self.fail_report {
                return Err(e.clone());
            }
            self.stats.borrow_mut().has_active_game = false;
            Ok(())
        }

        async fn player_stats(&self) -> Result<PlayerStats, LedgerError> {
            self.calls.borrow_mut().push("player_stats");
            Ok(self.stats.borrow().clone())
        }
    }

    fn summary(outcome: RoundOutcome) -> RoundSummary {
        RoundSummary {
            round: 1,
            outcome,
            score: 120,
            max_combo: 4,
            lives_left: 1,
            bricks_left: 0,
            ticks: 900,
        }
    }

    type Report = Pin<Box<dyn Future<Output = Result<(), LedgerError>>>>;

    /// Hand every loop outcome to the controller, keeping the report futures
    fn wire(game: &mut GameLoop, controller: &RoundController<MockLedger>) -> Rc<RefCell<Vec<Report>>> {
        let reports = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&reports);
        let controller = controller.clone();
        game.set_outcome_listener(move |summary| {
            if let Some(report) = controller.settle(summary) {
                sink.borrow_mut().push(Box::pin(report) as Report);
            }
        });
        reports
    }

    fn run_reports(reports: &Rc<RefCell<Vec<Report>>>) {
        let pending: Vec<Report> = reports.borrow_mut().drain(..).collect();
        for report in pending {
            block_on(report).unwrap();
        }
    }

    #[test]
    fn test_wei_display() {
        assert_eq!(Wei(0).to_string(), "0.0");
        assert_eq!(Wei(ETHER).to_string(), "1.0");
        assert_eq!(Wei(ETHER / 100).to_string(), "0.01");
        assert_eq!(Wei(ETHER * 3 / 2).to_string(), "1.5");
        assert_eq!(Wei(1).to_string(), "0.000000000000000001");
    }

    #[test]
    fn test_stats_from_bridge_json() {
        let json = r#"{"wins":2,"gamesPlayed":5,"totalEarnings":"20000000000000000","hasActiveGame":true}"#;
        let stats: PlayerStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.wins, 2);
        assert_eq!(stats.games_played, 5);
        assert_eq!(stats.total_earnings, Wei(ETHER / 50));
        assert!(stats.has_active_game);

        let back = serde_json::to_string(&stats).unwrap();
        assert!(back.contains(r#""totalEarnings":"20000000000000000""#));
        assert!(serde_json::from_str::<PlayerStats>(r#"{"totalEarnings":"abc"}"#).is_err());
    }

    #[test]
    fn test_provider_message_classifier() {
        assert_eq!(
            LedgerError::from_provider_message("execution reverted: require(false)"),
            LedgerError::ContractRejected
        );
        assert_eq!(
            LedgerError::from_provider_message("insufficient funds for gas * price + value"),
            LedgerError::InsufficientFunds
        );
        assert_eq!(
            LedgerError::from_provider_message("user rejected action"),
            LedgerError::UserRejected
        );
        assert_eq!(
            LedgerError::from_provider_message("nonce too low"),
            LedgerError::Provider("nonce too low".into())
        );
    }

    #[test]
    fn test_connect_loads_fee_reward_stats() {
        let controller = RoundController::new(MockLedger::funded());
        block_on(controller.connect()).unwrap();
        assert_eq!(controller.entry_fee(), Wei(ETHER / 100));
        assert_eq!(controller.win_reward(), Wei(ETHER / 50));
        assert_eq!(
            controller.ledger.calls(),
            ["entry_fee", "win_reward", "player_stats"]
        );
    }

    #[test]
    fn test_paid_round_win_reported_once() {
        let controller = RoundController::new(MockLedger::funded());
        block_on(controller.begin_paid_round()).unwrap();
        assert_eq!(controller.mode(), PlayMode::Paid);
        assert!(controller.stats().has_active_game);
        assert!(!controller.can_start_paid());

        let report = controller.settle(&summary(RoundOutcome::Win)).expect("first settle");
        assert!(controller.settle(&summary(RoundOutcome::Win)).is_none());
        block_on(report).unwrap();
        assert!(controller.settle(&summary(RoundOutcome::Win)).is_none());

        assert_eq!(controller.ledger.count("report_win"), 1);
        assert_eq!(controller.ledger.count("report_loss"), 0);
        let stats = controller.stats();
        assert_eq!(stats.wins, 1);
        assert!(!stats.has_active_game);
        assert!(controller.can_start_paid());
    }

    #[test]
    fn test_loss_reports_loss() {
        let controller = RoundController::new(MockLedger::funded());
        block_on(controller.begin_paid_round()).unwrap();
        let report = controller.settle(&summary(RoundOutcome::LoseGame)).unwrap();
        block_on(report).unwrap();
        assert_eq!(
            controller.ledger.calls(),
            [
                "entry_fee",
                "balance",
                "start_round",
                "player_stats",
                "report_loss",
                "player_stats"
            ]
        );
    }

    #[test]
    fn test_non_terminal_and_free_play_never_report() {
        let controller = RoundController::new(MockLedger::funded());
        block_on(controller.begin_paid_round()).unwrap();
        assert!(controller.settle(&summary(RoundOutcome::Continue)).is_none());
        assert!(
            controller
                .settle(&summary(RoundOutcome::LoseLife { lives_left: 2 }))
                .is_none()
        );

        let free = RoundController::new(MockLedger::funded());
        free.begin_free_play().unwrap();
        assert_eq!(free.mode(), PlayMode::FreePlay);
        assert!(free.settle(&summary(RoundOutcome::Win)).is_none());
        assert!(free.ledger.calls().is_empty());
    }

    #[test]
    fn test_active_game_blocks_paid_start() {
        let ledger = MockLedger::funded();
        ledger.stats.borrow_mut().has_active_game = true;
        let controller = RoundController::new(ledger);
        block_on(controller.refresh_stats()).unwrap();

        let err = block_on(controller.begin_paid_round()).unwrap_err();
        assert_eq!(err, LedgerError::ActiveGame);
        assert_eq!(controller.last_error(), Some(LedgerError::ActiveGame));
        assert_eq!(controller.ledger.count("start_round"), 0);
    }

    #[test]
    fn test_unsettled_round_blocks_paid_start() {
        let controller = RoundController::new(MockLedger::funded());
        block_on(controller.begin_paid_round()).unwrap();
        // Ledger forgets the open round; the local flag still holds
        controller.ledger.stats.borrow_mut().has_active_game = false;
        block_on(controller.refresh_stats()).unwrap();
        assert_eq!(
            block_on(controller.begin_paid_round()),
            Err(LedgerError::ActiveGame)
        );
    }

    #[test]
    fn test_insufficient_balance() {
        let controller = RoundController::new(MockLedger {
            fee: Wei(ETHER),
            balance: Wei(ETHER / 2),
            ..Default::default()
        });
        let err = block_on(controller.begin_paid_round()).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientBalance {
                needed: Wei(ETHER),
                available: Wei(ETHER / 2)
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient balance. You need 1.0 but only have 0.5."
        );
        assert_eq!(controller.mode(), PlayMode::Idle);
        assert!(!controller.is_busy());
        assert_eq!(controller.ledger.count("start_round"), 0);
    }

    #[test]
    fn test_rejected_start_leaves_round_unpaid() {
        let controller = RoundController::new(MockLedger {
            fail_start: Some(LedgerError::UserRejected),
            ..MockLedger::funded()
        });
        let err = block_on(controller.begin_paid_round()).unwrap_err();
        assert_eq!(err, LedgerError::UserRejected);
        assert_eq!(controller.mode(), PlayMode::Idle);
        assert!(controller.can_start_paid());
        assert!(controller.settle(&summary(RoundOutcome::Win)).is_none());
    }

    #[test]
    fn test_failed_report_surfaces_error_and_stays_settled() {
        let controller = RoundController::new(MockLedger {
            fail_report: Some(LedgerError::TransactionFailed),
            ..MockLedger::funded()
        });
        block_on(controller.begin_paid_round()).unwrap();
        let report = controller.settle(&summary(RoundOutcome::Win)).unwrap();
        assert_eq!(block_on(report), Err(LedgerError::TransactionFailed));
        assert_eq!(controller.last_error(), Some(LedgerError::TransactionFailed));
        // No retry and no stats refresh after the failure
        assert!(controller.settle(&summary(RoundOutcome::Win)).is_none());
        assert_eq!(controller.ledger.count("player_stats"), 1);

        controller.clear_error();
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn test_loop_outcomes_reach_ledger_once() {
        let controller = RoundController::new(MockLedger::funded());
        let mut game = GameLoop::new(&Settings::default());
        let reports = wire(&mut game, &controller);
        let mut renderer = HeadlessRenderer::default();

        // Clear all 50 bricks
        block_on(controller.begin_paid_round()).unwrap();
        assert!(game.start(1));
        let centers: Vec<Vec2> = game.state().bricks.iter().map(|b| b.center()).collect();
        for (i, center) in centers.into_iter().enumerate() {
            let state = game.state_mut();
            state.ball.pos = center;
            state.ball.vel = Vec2::ZERO;
            game.frame(i as f64 * 2000.0, Some(&mut renderer));
        }
        for t in 0..5 {
            assert_eq!(game.frame(200_000.0 + t as f64, Some(&mut renderer)), FrameStep::Halted);
        }
        run_reports(&reports);
        assert_eq!(controller.ledger.count("report_win"), 1);
        assert_eq!(controller.ledger.count("report_loss"), 0);
        assert_eq!(controller.stats().wins, 1);
        assert!(controller.can_start_paid());

        // Last life out the bottom
        block_on(controller.begin_paid_round()).unwrap();
        assert!(game.start(2));
        {
            let state = game.state_mut();
            state.score.lives = 1;
            state.ball.pos = Vec2::new(100.0, FIELD_HEIGHT - 5.0);
            state.ball.vel = Vec2::new(0.0, 4.0);
        }
        assert!(matches!(
            game.frame(16.0, Some(&mut renderer)),
            FrameStep::Finished(RoundSummary { outcome: RoundOutcome::LoseGame, round: 2, .. })
        ));
        assert_eq!(game.frame(32.0, Some(&mut renderer)), FrameStep::Halted);
        run_reports(&reports);
        assert_eq!(controller.ledger.count("report_win"), 1);
        assert_eq!(controller.ledger.count("report_loss"), 1);
        assert!(!controller.stats().has_active_game);
    }

    #[test]
    fn test_stopped_paid_round_reports_nothing() {
        let controller = RoundController::new(MockLedger::funded());
        let mut game = GameLoop::new(&Settings::default());
        let reports = wire(&mut game, &controller);
        let mut renderer = HeadlessRenderer::default();

        block_on(controller.begin_paid_round()).unwrap();
        game.start(1);
        assert_eq!(game.frame(16.0, Some(&mut renderer)), FrameStep::Continue);
        game.stop();
        assert_eq!(game.frame(32.0, Some(&mut renderer)), FrameStep::Halted);

        assert!(reports.borrow().is_empty());
        assert_eq!(controller.ledger.count("report_win"), 0);
        assert_eq!(controller.ledger.count("report_loss"), 0);
        // Still open on the ledger
        assert_eq!(controller.mode(), PlayMode::Paid);
        assert!(!controller.can_start_paid());
    }

    #[test]
    fn test_pending_fee_blocks_free_play_and_second_start() {
        let ledger = MockLedger::funded();
        ledger.hold_start.set(true);
        let controller = RoundController::new(ledger);

        let mut paid = Box::pin(controller.begin_paid_round());
        // Busy before the future first runs
        assert!(controller.is_busy());
        let mut cx = Context::from_waker(noop_waker_ref());
        assert!(paid.as_mut().poll(&mut cx).is_pending());
        assert_eq!(controller.ledger.calls(), ["entry_fee", "balance", "start_round"]);

        assert_eq!(controller.begin_free_play(), Err(LedgerError::Pending));
        assert_eq!(controller.mode(), PlayMode::Idle);
        assert_eq!(block_on(controller.begin_paid_round()), Err(LedgerError::Pending));
        assert_eq!(controller.last_error(), Some(LedgerError::Pending));
        assert!(!controller.can_start_paid());

        controller.ledger.hold_start.set(false);
        block_on(paid).unwrap();
        assert_eq!(controller.mode(), PlayMode::Paid);
        assert!(!controller.is_busy());
        assert_eq!(controller.ledger.count("start_round"), 1);
    }
}
