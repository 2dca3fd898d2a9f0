//! Reference screens
//!
//! Voice handling for every routed screen: login, dashboard, payment,
//! rewards, transactions, savings via shopping and settings. The screens
//! don't render anything: effects such as navigation are sent as
//! [`UiEffect`]s for whatever owns the UI to apply. [`screen_for`] builds the
//! dispatcher for a route.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::{Command, CommandDispatcher, DispatchContext, Intent};
use crate::grammar::Action;
use crate::language::Language;

/// Screens reachable by navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Login,
    Dashboard,
    Payment,
    Rewards,
    Settings,
    SavingsShopping,
    Transactions,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/",
            Route::Dashboard => "/dashboard",
            Route::Payment => "/payment",
            Route::Rewards => "/rewards",
            Route::Settings => "/settings",
            Route::SavingsShopping => "/savings-shopping",
            Route::Transactions => "/transactions",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Upi,
    Razorpay,
}

/// Side effects requested by a screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum UiEffect {
    Navigate { route: Route },
    OpenGoalForm,
    ChartsVisible { visible: bool },
    CommandListVisible { visible: bool },
    AmountEntered { amount: u64 },
    SubmitPayment { amount: u64, method: PaymentMethod },
    /// Shopping total and the amount rounded up into savings
    ShoppingAmountEntered { amount: u64, round_up: u64 },
    Logout,
}

/// Totals the dashboard and rewards screens read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub total_savings: u64,
    pub reward_points: u64,
    #[serde(default)]
    pub interest_earned: u64,
}

impl AccountSnapshot {
    /// Apply a submitted payment
    pub fn deposit(&mut self, amount: u64) {
        self.total_savings = self.total_savings.saturating_add(amount);
    }
}

/// Reward tier names by lower point bound, highest first
const TIERS: [(u64, &str); 4] = [
    (5000, "Platinum Saver"),
    (2500, "Gold Saver"),
    (1000, "Silver Saver"),
    (0, "Bronze Saver"),
];

fn reward_tier(points: u64) -> &'static str {
    TIERS
        .iter()
        .find(|(floor, _)| points >= *floor)
        .map_or("Bronze Saver", |(_, name)| name)
}

/// Shopping totals round up to the next multiple of this
const ROUND_UP_TO: u64 = 100;

fn round_up(amount: u64) -> u64 {
    match amount % ROUND_UP_TO {
        0 => 0,
        rest => ROUND_UP_TO - rest,
    }
}

fn send(effects: &mpsc::UnboundedSender<UiEffect>, effect: UiEffect) {
    debug!(?effect, "ui effect");
    let _ = effects.send(effect);
}

static AMOUNT: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new("[0-9]+").ok());

/// First run of ASCII digits in the transcript, e.g. `500` in
/// "add 500 rupees"
fn spoken_amount(transcript: &str) -> Option<u64> {
    AMOUNT
        .as_ref()?
        .find(transcript)
        .and_then(|m| m.as_str().parse().ok())
}

/// Format with thousands separators: 12450 -> "12,450"
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Main dashboard: navigation hub plus balance and rewards readouts
pub struct DashboardScreen {
    account: AccountSnapshot,
    charts_visible: bool,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl DashboardScreen {
    pub fn new(account: AccountSnapshot, effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self {
            account,
            charts_visible: false,
            effects,
        }
    }

    pub fn charts_visible(&self) -> bool {
        self.charts_visible
    }
}

impl CommandDispatcher for DashboardScreen {
    fn name(&self) -> &str {
        "dashboard"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some(
            "Welcome to your dashboard. Say add money, check balance, show rewards, or settings."
                .into(),
        )
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        let Intent::Action(action) = command.intent else {
            ctx.not_understood(&command.transcript);
            return;
        };

        match action {
            Action::AddMoney => {
                send(&self.effects, UiEffect::Navigate { route: Route::Payment });
                ctx.speak("Navigating to payment page");
            }
            Action::CreateGoal => {
                send(&self.effects, UiEffect::OpenGoalForm);
                ctx.speak("Opening the new goal form");
            }
            Action::CheckBalance => {
                ctx.speak(&format!(
                    "Your current savings balance is ₹{}",
                    group_digits(self.account.total_savings)
                ));
            }
            Action::ShowRewards | Action::ViewRewards => {
                send(&self.effects, UiEffect::Navigate { route: Route::Rewards });
                ctx.speak(&format!("You have {} reward points", self.account.reward_points));
            }
            Action::OpenSettings => {
                send(&self.effects, UiEffect::Navigate { route: Route::Settings });
                ctx.speak("Opening settings");
            }
            Action::Logout => {
                ctx.speak("Signing you out");
                send(&self.effects, UiEffect::Logout);
            }
            Action::ShowCharts => {
                self.charts_visible = !self.charts_visible;
                send(
                    &self.effects,
                    UiEffect::ChartsVisible {
                        visible: self.charts_visible,
                    },
                );
                ctx.speak(if self.charts_visible {
                    "Showing charts"
                } else {
                    "Hiding charts"
                });
            }
            Action::SavingsShopping => {
                send(&self.effects, UiEffect::Navigate { route: Route::SavingsShopping });
                ctx.speak("Opening savings via shopping screen");
            }
            Action::MyTransactions => {
                send(&self.effects, UiEffect::Navigate { route: Route::Transactions });
                ctx.speak("Opening transaction history");
            }
            Action::ShowHelp => {
                ctx.speak(
                    "You can say: add money, create goal, check balance, show rewards, \
                     show charts, my transactions, settings, or sign out.",
                );
            }
            Action::GoDashboard | Action::GoBack => ctx.not_understood(&command.transcript),
        }
    }
}

/// Payment form: amount entry and submission
pub struct PaymentScreen {
    amount: Option<u64>,
    method: Option<PaymentMethod>,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl PaymentScreen {
    pub fn new(effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self {
            amount: None,
            method: None,
            effects,
        }
    }

    /// Pointer/keyboard selection of the payment method
    pub fn select_method(&mut self, method: PaymentMethod) {
        self.method = Some(method);
    }

    pub fn amount(&self) -> Option<u64> {
        self.amount
    }
}

impl CommandDispatcher for PaymentScreen {
    fn name(&self) -> &str {
        "payment"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some("Enter an amount and choose UPI or Razor Pay, then say add money.".into())
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        if command.intent == Intent::Action(Action::AddMoney) {
            if let Some(amount) = spoken_amount(&command.transcript) {
                self.amount = Some(amount);
                send(&self.effects, UiEffect::AmountEntered { amount });
                ctx.speak(&format!(
                    "Amount set to {amount} rupees. Please select a payment method."
                ));
                return;
            }
        }

        match command.intent {
            Intent::Action(Action::AddMoney) => match (self.amount, self.method) {
                (Some(amount), Some(method)) => {
                    send(&self.effects, UiEffect::SubmitPayment { amount, method });
                    ctx.speak(&format!("Adding ₹{} to your savings", group_digits(amount)));
                }
                _ => ctx.speak("Please enter amount and select payment method first."),
            },
            Intent::Action(Action::GoBack | Action::GoDashboard) => {
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::ShowHelp) => {
                ctx.speak(
                    "Enter amount, select UPI or Razor Pay, then say add money to proceed.",
                );
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Settings screen
pub struct SettingsScreen {
    commands_visible: bool,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl SettingsScreen {
    pub fn new(effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self {
            commands_visible: false,
            effects,
        }
    }
}

impl CommandDispatcher for SettingsScreen {
    fn name(&self) -> &str {
        "settings"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some("This is settings. Say help to see voice commands, or go back.".into())
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        match command.intent {
            Intent::Action(Action::GoBack | Action::GoDashboard) => {
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::ShowHelp) => {
                self.commands_visible = !self.commands_visible;
                send(
                    &self.effects,
                    UiEffect::CommandListVisible {
                        visible: self.commands_visible,
                    },
                );
                ctx.speak(if self.commands_visible {
                    "Showing available voice commands"
                } else {
                    "Hiding voice commands"
                });
            }
            Intent::Action(Action::Logout) => {
                ctx.speak("Signing you out");
                send(&self.effects, UiEffect::Logout);
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Sign-in screen shown at start and after logout
pub struct LoginScreen {
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl LoginScreen {
    pub fn new(effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self { effects }
    }
}

impl CommandDispatcher for LoginScreen {
    fn name(&self) -> &str {
        "login"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some("Welcome to Smart Savings. Say go to dashboard to sign in.".into())
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        match command.intent {
            Intent::Action(Action::GoDashboard) => {
                ctx.speak("Signing you in");
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::ShowHelp) => {
                ctx.speak("Enter your email and password, or say go to dashboard to sign in.");
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Reward points, tier and interest earned
pub struct RewardsScreen {
    account: AccountSnapshot,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl RewardsScreen {
    pub fn new(account: AccountSnapshot, effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self { account, effects }
    }
}

impl CommandDispatcher for RewardsScreen {
    fn name(&self) -> &str {
        "rewards"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        let points = self.account.reward_points;
        Some(format!(
            "Rewards screen. You have {} reward points and are currently in the {} tier. \
             You've earned ₹{} in interest rewards.",
            group_digits(points),
            reward_tier(points),
            group_digits(self.account.interest_earned),
        ))
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        match command.intent {
            Intent::Action(Action::GoBack | Action::GoDashboard) => {
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::CheckBalance) => {
                ctx.speak(&format!(
                    "You have {} reward points and have earned ₹{} in interest.",
                    group_digits(self.account.reward_points),
                    group_digits(self.account.interest_earned),
                ));
            }
            Intent::Action(Action::ShowHelp) => {
                ctx.speak(
                    "This is your rewards screen. You can see your points, tier status, \
                     and interest earned. Say go back to return to dashboard.",
                );
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Transaction history
pub struct TransactionsScreen {
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl TransactionsScreen {
    pub fn new(effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self { effects }
    }
}

impl CommandDispatcher for TransactionsScreen {
    fn name(&self) -> &str {
        "transactions"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some(
            "Transactions screen. Here you can view all your transaction history including \
             deposits, savings via shopping, and goal contributions."
                .into(),
        )
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        match command.intent {
            Intent::Action(Action::GoBack | Action::GoDashboard) => {
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::ShowHelp) => {
                ctx.speak(
                    "This is your transaction history. You can search transactions or filter \
                     by type. Say go back to return to dashboard.",
                );
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Shopping round-ups: the spare change of a purchase goes to savings
pub struct SavingsShoppingScreen {
    amount: Option<u64>,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl SavingsShoppingScreen {
    pub fn new(effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self {
            amount: None,
            effects,
        }
    }

    pub fn amount(&self) -> Option<u64> {
        self.amount
    }
}

impl CommandDispatcher for SavingsShoppingScreen {
    fn name(&self) -> &str {
        "savings_shopping"
    }

    fn guide(&self, _language: Language) -> Option<String> {
        Some(
            "Savings via Shopping screen. Enter your shopping amount and select a goal \
             to add the rounded up amount."
                .into(),
        )
    }

    fn on_command(&mut self, command: &Command, ctx: &mut DispatchContext<'_>) {
        match command.intent {
            Intent::Action(Action::AddMoney) => match spoken_amount(&command.transcript) {
                Some(amount) => {
                    let round_up = round_up(amount);
                    self.amount = Some(amount);
                    send(&self.effects, UiEffect::ShoppingAmountEntered { amount, round_up });
                    ctx.speak(&format!(
                        "Shopping amount set to {amount} rupees. \
                         ₹{round_up} will be rounded up into savings."
                    ));
                }
                None => ctx.speak("Please say the shopping amount, for example add 250."),
            },
            Intent::Action(Action::GoBack | Action::GoDashboard) => {
                send(&self.effects, UiEffect::Navigate { route: Route::Dashboard });
            }
            Intent::Action(Action::ShowHelp) => {
                ctx.speak(
                    "Enter your shopping amount, select a savings goal, and the rounded up \
                     amount will be added to your goal.",
                );
            }
            _ => ctx.not_understood(&command.transcript),
        }
    }
}

/// Voice dispatcher for a route
pub fn screen_for(
    route: Route,
    account: AccountSnapshot,
    effects: mpsc::UnboundedSender<UiEffect>,
) -> Box<dyn CommandDispatcher> {
    match route {
        Route::Login => Box::new(LoginScreen::new(effects)),
        Route::Dashboard => Box::new(DashboardScreen::new(account, effects)),
        Route::Payment => Box::new(PaymentScreen::new(effects)),
        Route::Rewards => Box::new(RewardsScreen::new(account, effects)),
        Route::Settings => Box::new(SettingsScreen::new(effects)),
        Route::SavingsShopping => Box::new(SavingsShoppingScreen::new(effects)),
        Route::Transactions => Box::new(TransactionsScreen::new(effects)),
    }
}

/// Follows screen effects for whatever owns the UI: holds the account the
/// screens read and picks the screen to mount next
pub struct Navigator {
    account: AccountSnapshot,
    effects: mpsc::UnboundedSender<UiEffect>,
}

impl Navigator {
    pub fn new(account: AccountSnapshot, effects: mpsc::UnboundedSender<UiEffect>) -> Self {
        Self { account, effects }
    }

    pub fn account(&self) -> AccountSnapshot {
        self.account
    }

    pub fn screen(&self, route: Route) -> Box<dyn CommandDispatcher> {
        screen_for(route, self.account, self.effects.clone())
    }

    /// Screen to mount after `effect`, or `None` when the current screen
    /// stays. A submitted payment is deposited and returns to the dashboard.
    pub fn apply(&mut self, effect: &UiEffect) -> Option<Box<dyn CommandDispatcher>> {
        match *effect {
            UiEffect::Navigate { route } => Some(self.screen(route)),
            UiEffect::SubmitPayment { amount, method } => {
                self.account.deposit(amount);
                info!(amount, ?method, total = self.account.total_savings, "payment applied");
                Some(self.screen(Route::Dashboard))
            }
            UiEffect::Logout => Some(self.screen(Route::Login)),
            UiEffect::OpenGoalForm
            | UiEffect::ChartsVisible { .. }
            | UiEffect::CommandListVisible { .. }
            | UiEffect::AmountEntered { .. }
            | UiEffect::ShoppingAmountEntered { .. } => None,
        }
    }
}
