//! Accounting Entry Generator.
//!
//! Every posting is balanced on the unrounded amounts first, then each line is
//! rounded to the tenant's money scale. Whatever the rounding leaves between the
//! two sides goes to the chart's rounding account.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{DocumentRef, DomainError, DomainResult, PaymentMethod, Settlement, round_money};

use crate::chart::{ChartOfAccounts, ExpenseCategory};
use crate::entry::JournalLine;

/// A completed business event with the values that must reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BusinessEvent {
    /// One value per received item (`quantity × unit_price`).
    PurchaseReceived {
        settlement: Settlement,
        item_values: Vec<Decimal>,
    },
    SaleCompleted {
        method: PaymentMethod,
        total: Decimal,
        /// Part of `total` actually collected with `method`; the rest is receivable.
        collected: Decimal,
        /// Sum of the sale movements' `quantity × unit_cost_at_time`.
        cost_of_goods_sold: Decimal,
    },
    /// Signed value per adjusted count item (`variance × unit cost`).
    InventoryVariance { item_values: Vec<Decimal> },
    Expense {
        category: ExpenseCategory,
        amount: Decimal,
    },
}

/// A balanced set of journal lines for one source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub source: DocumentRef,
    pub description: String,
    pub lines: Vec<JournalLine>,
}

impl Posting {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn total_debits(&self) -> Decimal {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Decimal {
        self.lines.iter().map(|l| l.credit).sum()
    }
}

/// Check that `lines` has no negative amounts and that debits equal credits exactly.
pub fn validate_balanced(lines: &[JournalLine]) -> DomainResult<()> {
    if lines
        .iter()
        .any(|l| l.debit < Decimal::ZERO || l.credit < Decimal::ZERO)
    {
        return Err(DomainError::validation("journal line amounts cannot be negative"));
    }
    let debits: Decimal = lines.iter().map(|l| l.debit).sum();
    let credits: Decimal = lines.iter().map(|l| l.credit).sum();
    if debits != credits {
        return Err(DomainError::UnbalancedEntry { debits, credits });
    }
    Ok(())
}

/// Turns [`BusinessEvent`]s into balanced [`Posting`]s against a chart of accounts.
#[derive(Debug, Clone, Copy)]
pub struct PostingGenerator<'a> {
    chart: &'a ChartOfAccounts,
    scale: u32,
}

impl<'a> PostingGenerator<'a> {
    pub fn new(chart: &'a ChartOfAccounts, scale: u32) -> Self {
        Self { chart, scale }
    }

    pub fn generate(&self, source: DocumentRef, event: &BusinessEvent) -> DomainResult<Posting> {
        let chart = self.chart;
        let (description, lines) = match event {
            BusinessEvent::PurchaseReceived {
                settlement,
                item_values,
            } => {
                let mut lines: Vec<JournalLine> = item_values
                    .iter()
                    .map(|v| JournalLine::debit(&chart.inventory, *v))
                    .collect();
                let total: Decimal = item_values.iter().copied().sum();
                lines.push(JournalLine::credit(chart.settlement_account(*settlement), total));
                ("Purchase receipt".to_string(), lines)
            }
            BusinessEvent::SaleCompleted {
                method,
                total,
                collected,
                cost_of_goods_sold,
            } => {
                if collected > total || *collected < Decimal::ZERO {
                    return Err(DomainError::validation(format!(
                        "collected amount {collected} must be between 0 and the sale total {total}"
                    )));
                }
                let lines = vec![
                    JournalLine::debit(chart.collection_account(*method), *collected),
                    JournalLine::debit(&chart.receivable, *total - *collected),
                    JournalLine::credit(&chart.revenue, *total),
                    JournalLine::debit(&chart.cost_of_goods_sold, *cost_of_goods_sold),
                    JournalLine::credit(&chart.inventory, *cost_of_goods_sold),
                ];
                (format!("Sale ({method})"), lines)
            }
            BusinessEvent::InventoryVariance { item_values } => {
                let mut lines = Vec::with_capacity(item_values.len() * 2);
                for value in item_values {
                    if *value >= Decimal::ZERO {
                        lines.push(JournalLine::debit(&chart.inventory, *value));
                        lines.push(JournalLine::credit(&chart.inventory_gain, *value));
                    } else {
                        lines.push(JournalLine::debit(&chart.shrinkage, -*value));
                        lines.push(JournalLine::credit(&chart.inventory, -*value));
                    }
                }
                ("Inventory count variance".to_string(), lines)
            }
            BusinessEvent::Expense { category, amount } => (
                format!("Expense ({category:?})").to_lowercase(),
                vec![
                    JournalLine::debit(chart.expense_account(*category), *amount),
                    JournalLine::credit(&chart.cash, *amount),
                ],
            ),
        };
        self.balance(source, description, lines)
    }

    /// Validate a caller-supplied breakdown, round it, and post the rounding remainder.
    ///
    /// Zero lines are dropped, so an event with no value yields an empty posting.
    pub fn balance(
        &self,
        source: DocumentRef,
        description: impl Into<String>,
        lines: Vec<JournalLine>,
    ) -> DomainResult<Posting> {
        validate_balanced(&lines)?;

        let mut rounded: Vec<JournalLine> = lines
            .into_iter()
            .map(|l| JournalLine {
                account: l.account,
                debit: round_money(l.debit, self.scale),
                credit: round_money(l.credit, self.scale),
            })
            .filter(|l| !l.debit.is_zero() || !l.credit.is_zero())
            .collect();

        let remainder: Decimal = rounded.iter().map(JournalLine::net).sum();
        if remainder > Decimal::ZERO {
            rounded.push(JournalLine::credit(&self.chart.rounding, remainder));
        } else if remainder < Decimal::ZERO {
            rounded.push(JournalLine::debit(&self.chart.rounding, -remainder));
        }

        let posting = Posting {
            source,
            description: description.into(),
            lines: rounded,
        };
        if posting.total_debits() != posting.total_credits() {
            return Err(DomainError::UnbalancedEntry {
                debits: posting.total_debits(),
                credits: posting.total_credits(),
            });
        }
        Ok(posting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptoir_core::{AggregateId, DocumentKind};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn source() -> DocumentRef {
        DocumentRef::new(DocumentKind::Sale, AggregateId::new())
    }

    fn net_of(posting: &Posting, account: &str) -> Decimal {
        posting
            .lines
            .iter()
            .filter(|l| l.account.as_str() == account)
            .map(JournalLine::net)
            .sum()
    }

    #[test]
    fn sale_posts_revenue_collection_and_cost() {
        let chart = ChartOfAccounts::default();
        let generator = PostingGenerator::new(&chart, 2);
        let posting = generator
            .generate(
                source(),
                &BusinessEvent::SaleCompleted {
                    method: PaymentMethod::Cash,
                    total: dec!(450),
                    collected: dec!(450),
                    cost_of_goods_sold: dec!(300),
                },
            )
            .unwrap();

        assert_eq!(net_of(&posting, "1100"), dec!(450));
        assert_eq!(net_of(&posting, "4000"), dec!(-450));
        assert_eq!(net_of(&posting, "5000"), dec!(300));
        assert_eq!(net_of(&posting, "1300"), dec!(-300));
        // No shortfall, so no receivable line.
        assert_eq!(posting.lines.len(), 4);
        assert_eq!(posting.total_debits(), posting.total_credits());
    }

    #[test]
    fn partial_payment_debits_receivable() {
        let chart = ChartOfAccounts::default();
        let posting = PostingGenerator::new(&chart, 2)
            .generate(
                source(),
                &BusinessEvent::SaleCompleted {
                    method: PaymentMethod::MobileMoney,
                    total: dec!(100),
                    collected: dec!(60),
                    cost_of_goods_sold: dec!(0),
                },
            )
            .unwrap();
        assert_eq!(net_of(&posting, "1250"), dec!(60));
        assert_eq!(net_of(&posting, "4110"), dec!(40));
        assert_eq!(posting.lines.len(), 3);
    }

    #[test]
    fn rounding_remainder_goes_to_rounding_account() {
        let chart = ChartOfAccounts::default();
        let posting = PostingGenerator::new(&chart, 2)
            .generate(
                source(),
                &BusinessEvent::PurchaseReceived {
                    settlement: Settlement::OnAccount,
                    // 0.005 + 0.005 rounds to 0.01 + 0.01 on the debit side, 0.01 on the credit side.
                    item_values: vec![dec!(0.005), dec!(0.005)],
                },
            )
            .unwrap();
        assert_eq!(net_of(&posting, "1300"), dec!(0.02));
        assert_eq!(net_of(&posting, "2100"), dec!(-0.01));
        assert_eq!(net_of(&posting, "6580"), dec!(-0.01));
        assert_eq!(posting.total_debits(), posting.total_credits());
    }

    #[test]
    fn variance_pairs_follow_sign() {
        let chart = ChartOfAccounts::default();
        let posting = PostingGenerator::new(&chart, 2)
            .generate(
                source(),
                &BusinessEvent::InventoryVariance {
                    item_values: vec![dec!(-100), dec!(25)],
                },
            )
            .unwrap();
        assert_eq!(net_of(&posting, "8200"), dec!(100));
        assert_eq!(net_of(&posting, "8100"), dec!(-25));
        assert_eq!(net_of(&posting, "1300"), dec!(-75));
        assert_eq!(posting.lines.len(), 4);
    }

    #[test]
    fn unbalanced_breakdown_is_rejected() {
        let chart = ChartOfAccounts::default();
        let err = PostingGenerator::new(&chart, 2)
            .balance(
                source(),
                "manual",
                vec![
                    JournalLine::debit(&chart.cash, dec!(10)),
                    JournalLine::credit(&chart.revenue, dec!(9.99)),
                ],
            )
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::UnbalancedEntry {
                debits: dec!(10),
                credits: dec!(9.99)
            }
        );
        assert!(err.is_internal());
    }

    #[test]
    fn overpaid_collection_is_rejected() {
        let chart = ChartOfAccounts::default();
        let result = PostingGenerator::new(&chart, 2).generate(
            source(),
            &BusinessEvent::SaleCompleted {
                method: PaymentMethod::Cash,
                total: dec!(10),
                collected: dec!(11),
                cost_of_goods_sold: dec!(0),
            },
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Generated postings always balance after rounding, for every event type.
        #[test]
        fn generated_postings_balance(
            values in prop::collection::vec(-1_000_000i64..1_000_000i64, 1..12),
            scale in 0u32..4,
        ) {
            let chart = ChartOfAccounts::default();
            let generator = PostingGenerator::new(&chart, scale);
            // Four decimal places so rounding actually happens.
            let decimals: Vec<Decimal> = values.iter().map(|v| Decimal::new(*v, 4)).collect();
            let positive: Vec<Decimal> = decimals.iter().map(|d| d.abs()).collect();
            let total: Decimal = positive.iter().copied().sum();

            let events = vec![
                BusinessEvent::PurchaseReceived { settlement: Settlement::OnAccount, item_values: positive.clone() },
                BusinessEvent::InventoryVariance { item_values: decimals.clone() },
                BusinessEvent::SaleCompleted {
                    method: PaymentMethod::Card,
                    total,
                    collected: total - positive[0],
                    cost_of_goods_sold: positive[0],
                },
            ];
            for event in &events {
                let posting = generator.generate(source(), event).unwrap();
                prop_assert_eq!(posting.total_debits(), posting.total_credits());
                for line in &posting.lines {
                    prop_assert_eq!(line.debit, round_money(line.debit, scale));
                    prop_assert_eq!(line.credit, round_money(line.credit, scale));
                }
            }
        }
    }
}
