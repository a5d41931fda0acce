//! The allocation engine: one transaction in, one allocation out.
//!
//! The engine is stateless between calls. It reads the portfolio snapshot,
//! never mutates it, and produces the same result for the same inputs
//! (apart from the decorative explanation when a custom narrator is set).

use crate::config::EngineConfig;
use crate::core::category::AllocationMode;
use crate::core::currency::FxRateTable;
use crate::core::portfolio::Portfolio;
use crate::core::transaction::TransactionRequest;
use crate::error::{AllocationError, Result};
use crate::narrative::{narrate_or_template, Narrator};
use crate::optimization::allocator::{
    rank_by, AllocationStrategy, GreedyFill, NoSplitHeuristic, StrategyKind,
};
use crate::optimization::benefit::{BenefitModel, SavingsProfile};
use crate::optimization::composer::{AllocationResult, Composition};
use crate::optimization::liquidity::LiquiditySummary;
use crate::optimization::slot::{evaluate_slots, EvaluatedSlot};
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

pub struct AllocationEngine {
    config: EngineConfig,
    fx: FxRateTable,
    narrator: Option<Box<dyn Narrator + Send + Sync>>,
}

impl AllocationEngine {
    /// Engine with the built-in FX table when the configured home currency
    /// matches it, otherwise an empty table for that home currency.
    pub fn new(config: EngineConfig) -> Self {
        let reference = FxRateTable::reference();
        let fx = if reference.home_currency == config.home_currency {
            reference
        } else {
            FxRateTable::new(config.home_currency.clone())
        };
        Self {
            config,
            fx,
            narrator: None,
        }
    }

    pub fn with_fx_table(mut self, fx: FxRateTable) -> Self {
        self.fx = fx;
        self
    }

    pub fn with_narrator(mut self, narrator: impl Narrator + Send + Sync + 'static) -> Self {
        self.narrator = Some(Box::new(narrator));
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fx_table(&self) -> &FxRateTable {
        &self.fx
    }

    /// Candidate sources for `request` with their capacities and rates, in
    /// tie-break order. Exposed for diagnostics and the liquidity report.
    pub fn evaluate<'p>(
        &self,
        request: &TransactionRequest,
        portfolio: &'p Portfolio,
        today: NaiveDate,
    ) -> Result<(Decimal, Vec<EvaluatedSlot<'p>>)> {
        let amount_home = self.amount_home(request)?;
        let savings = SavingsProfile::from_accounts(&portfolio.debit_accounts);
        let model = self.benefit_model(request, portfolio, &savings, amount_home);
        let slots = evaluate_slots(
            portfolio,
            &model,
            request.effective_mode(),
            today,
            self.config.capacity_epsilon,
        );
        Ok((amount_home, slots))
    }

    /// Allocate one transaction across the portfolio's sources.
    ///
    /// # Errors
    ///
    /// - [`AllocationError::InvalidAmount`] for non-positive amounts.
    /// - [`AllocationError::UnknownCurrency`] when no FX rate exists.
    /// - [`AllocationError::NoAvailableSource`] when every source is empty.
    /// - [`AllocationError::InsufficientLiquidity`] when total capacity is
    ///   below the amount.
    /// - [`AllocationError::SolverInfeasible`] if the fill cannot place the
    ///   amount despite sufficient capacity.
    pub fn optimise(
        &self,
        request: &TransactionRequest,
        portfolio: &Portfolio,
        today: NaiveDate,
    ) -> Result<AllocationResult> {
        log::info!(
            "REQUEST   | {} {} {} ({})",
            request.amount,
            request.currency,
            request.category,
            request.label()
        );

        let amount_home = self.amount_home(request)?;
        let savings = SavingsProfile::from_accounts(&portfolio.debit_accounts);
        let mode = request.effective_mode();
        let model = self.benefit_model(request, portfolio, &savings, amount_home);
        let slots = evaluate_slots(portfolio, &model, mode, today, self.config.capacity_epsilon);

        let fill_rate = self.fill_rate();
        for (rank, &i) in rank_by(&slots, fill_rate).iter().enumerate() {
            let slot = &slots[i];
            log::debug!(
                "RANK {:>2}   | T{} {:<28} cap={:<10} rate={}",
                rank + 1,
                slot.tier().number(),
                slot.source.name(),
                slot.capacity,
                fill_rate(slot)
            );
        }

        if slots.is_empty() {
            log::warn!("LIQUIDITY | no source has capacity for {}", amount_home);
            return Err(AllocationError::NoAvailableSource {
                requested: amount_home,
            });
        }

        let liquidity = LiquiditySummary::from_slots(&slots, amount_home);
        if !liquidity.is_sufficient() {
            log::warn!(
                "LIQUIDITY | requested {} but only {} available",
                amount_home,
                liquidity.total_capacity
            );
            return Err(AllocationError::InsufficientLiquidity {
                requested: amount_home,
                available: liquidity.total_capacity,
                shortfall: liquidity.shortfall(),
            });
        }

        let strategy = self.strategy(mode);
        let fills = strategy.allocate(&slots, amount_home)?;

        let composition = Composition {
            request,
            amount_home,
            home_currency: &self.fx.home_currency,
            mode,
            strategy: self.config.strategy,
            model: &model,
            savings: &savings,
        };
        let mut result = composition.compose(&slots, &fills);
        result.explanation = narrate_or_template(
            self.narrator.as_deref().map(|n| n as &dyn Narrator),
            &result,
        );

        log::info!(
            "DECISION  | {} via {} | net EOM {} | cashback {} | {} line(s)",
            result.decision,
            strategy.name(),
            result.eom_impact.net_eom_benefit,
            result.eom_impact.total_cashback_earned,
            result.lines.len()
        );

        Ok(result)
    }

    /// Rate the configured strategy fills by.
    fn fill_rate(&self) -> fn(&EvaluatedSlot<'_>) -> Decimal {
        fn net(slot: &EvaluatedSlot<'_>) -> Decimal {
            slot.net_benefit_rate
        }
        fn ranking(slot: &EvaluatedSlot<'_>) -> Decimal {
            slot.ranking_rate
        }
        match self.config.strategy {
            StrategyKind::Exact => net,
            StrategyKind::Heuristic => ranking,
        }
    }

    fn amount_home(&self, request: &TransactionRequest) -> Result<Decimal> {
        if request.amount <= Decimal::ZERO {
            return Err(AllocationError::InvalidAmount(request.amount));
        }
        let amount_home = self
            .fx
            .to_home(request.amount, &request.currency)?
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if amount_home <= Decimal::ZERO {
            return Err(AllocationError::InvalidAmount(amount_home));
        }
        Ok(amount_home)
    }

    fn benefit_model(
        &self,
        request: &TransactionRequest,
        portfolio: &Portfolio,
        savings: &SavingsProfile,
        amount_home: Decimal,
    ) -> BenefitModel {
        BenefitModel {
            category: request.category,
            fallback_category: self.config.fallback_category,
            pays_in_full: portfolio.preferences.pays_in_full,
            blended_savings_monthly: savings.weighted_rate_monthly,
            spend_amount: amount_home,
            grace_basis_days: self.config.grace_basis_days,
        }
    }

    fn strategy(&self, mode: AllocationMode) -> Box<dyn AllocationStrategy> {
        match self.config.strategy {
            StrategyKind::Exact => Box::new(GreedyFill),
            StrategyKind::Heuristic => Box::new(NoSplitHeuristic {
                split_threshold: self.config.split_threshold,
                mode,
            }),
        }
    }
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for AllocationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AllocationEngine")
            .field("config", &self.config)
            .field("fx", &self.fx)
            .field("narrator", &self.narrator.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::SpendCategory;
    use crate::core::currency::CurrencyCode;
    use crate::core::source::{CreditSource, DebitSource};
    use crate::optimization::decision::Decision;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 5).unwrap()
    }

    fn portfolio() -> Portfolio {
        Portfolio::new("u1", "Test User")
            .with_credit(
                CreditSource::new("amex", "Amex Gold", dec!(5000), dec!(0))
                    .with_cashback(SpendCategory::Hotel, dec!(0.05))
                    .with_cashback(SpendCategory::Other, dec!(0.01)),
            )
            .with_debit(DebitSource::new("current", "Current", dec!(2000), dec!(0.01)).primary())
    }

    #[test]
    fn test_fill_rate_follows_strategy() {
        // grocery is interest-only, so the card's ranking rate drops its cashback
        let request =
            TransactionRequest::new(dec!(40), CurrencyCode::new("GBP"), SpendCategory::Grocery);
        let portfolio = portfolio();
        let exact = AllocationEngine::default();
        let (_, slots) = exact.evaluate(&request, &portfolio, today()).unwrap();
        let card = &slots[0];
        assert_ne!(card.net_benefit_rate, card.ranking_rate);
        assert_eq!((exact.fill_rate())(card), card.net_benefit_rate);

        let heuristic =
            AllocationEngine::new(EngineConfig::default().with_strategy(StrategyKind::Heuristic));
        assert_eq!((heuristic.fill_rate())(card), card.ranking_rate);
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let engine = AllocationEngine::default();
        let mut request =
            TransactionRequest::new(dec!(10), CurrencyCode::new("GBP"), SpendCategory::Hotel);
        request.amount = dec!(-5);
        let err = engine.optimise(&request, &portfolio(), today()).unwrap_err();
        assert_eq!(err, AllocationError::InvalidAmount(dec!(-5)));
    }

    #[test]
    fn test_unknown_currency_rejected() {
        let engine = AllocationEngine::default();
        let request =
            TransactionRequest::new(dec!(10), CurrencyCode::new("JPY"), SpendCategory::Hotel);
        let err = engine.optimise(&request, &portfolio(), today()).unwrap_err();
        assert!(matches!(err, AllocationError::UnknownCurrency(_)));
    }

    #[test]
    fn test_best_card_selected() {
        let engine = AllocationEngine::default();
        let request =
            TransactionRequest::new(dec!(200), CurrencyCode::new("GBP"), SpendCategory::Hotel);
        let result = engine.optimise(&request, &portfolio(), today()).unwrap();
        assert_eq!(result.decision, Decision::CreditOptimised);
        assert_eq!(result.lines[0].cashback_earned, dec!(10));
        assert!(!result.explanation.is_empty());
    }

    #[test]
    fn test_empty_portfolio_has_no_source() {
        let engine = AllocationEngine::default();
        let request =
            TransactionRequest::new(dec!(10), CurrencyCode::new("GBP"), SpendCategory::Hotel);
        let err = engine
            .optimise(&request, &Portfolio::new("u", "Nobody"), today())
            .unwrap_err();
        assert_eq!(err, AllocationError::NoAvailableSource { requested: dec!(10) });
    }

    #[test]
    fn test_foreign_amount_converted_before_allocation() {
        let engine = AllocationEngine::default();
        let request =
            TransactionRequest::new(dec!(100), CurrencyCode::new("USD"), SpendCategory::Hotel);
        let result = engine.optimise(&request, &portfolio(), today()).unwrap();
        assert_eq!(result.amount_home, dec!(79.12));
        assert_eq!(result.total_allocated(), dec!(79.12));
    }
}
