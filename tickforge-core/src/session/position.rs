//! Netted position accounting for one session. Quantities are contracts,
//! PnL is index points on the netted lot (not scaled by quantity or
//! contract multiplier).

use rust_decimal::Decimal;

use crate::domain::Side;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PositionBook {
    net: i32,
    avg_entry: Decimal,
    realized: Decimal,
    floating: Decimal,
}

impl PositionBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn net(&self) -> i32 {
        self.net
    }

    pub fn side(&self) -> Option<Side> {
        match self.net {
            0 => None,
            n if n > 0 => Some(Side::Long),
            _ => Some(Side::Short),
        }
    }

    pub fn avg_entry(&self) -> Decimal {
        self.avg_entry
    }

    pub fn realized(&self) -> Decimal {
        self.realized
    }

    pub fn floating(&self) -> Decimal {
        self.floating
    }

    pub fn total(&self) -> Decimal {
        self.realized + self.floating
    }

    pub fn is_flat(&self) -> bool {
        self.net == 0
    }

    /// Apply a fill. Returns the realized PnL delta (zero unless the fill
    /// nets against the open position).
    pub fn apply_fill(&mut self, side: Side, qty: u32, price: Decimal) -> Decimal {
        if qty == 0 {
            return Decimal::ZERO;
        }

        let signed = side.sign() * qty as i32;
        let net = self.net;

        if net == 0 {
            self.net = signed;
            self.avg_entry = price;
            self.mark(price, price);
            return Decimal::ZERO;
        }

        if net.signum() == signed.signum() {
            let abs_net = Decimal::from(net.unsigned_abs());
            let abs_add = Decimal::from(qty);
            self.avg_entry = (self.avg_entry * abs_net + price * abs_add) / (abs_net + abs_add);
            self.net = net + signed;
            self.mark(price, price);
            return Decimal::ZERO;
        }

        let pnl = if net > 0 {
            price - self.avg_entry
        } else {
            self.avg_entry - price
        };
        self.realized += pnl;

        self.net = net + signed;
        if self.net == 0 {
            self.avg_entry = Decimal::ZERO;
            self.floating = Decimal::ZERO;
            return pnl;
        }

        if self.net.signum() != net.signum() {
            // Flipped through flat: remainder opens at the fill price.
            self.avg_entry = price;
        }
        self.mark(price, price);
        pnl
    }

    /// Refresh floating PnL from the current quote. Longs mark against the
    /// bid, shorts against the ask.
    pub fn mark(&mut self, bid: Decimal, ask: Decimal) {
        if self.net == 0 {
            self.floating = Decimal::ZERO;
        } else if self.net > 0 {
            self.floating = bid - self.avg_entry;
        } else {
            self.floating = self.avg_entry - ask;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn open_then_close_realizes_spread() {
        let mut book = PositionBook::new();
        assert_eq!(book.apply_fill(Side::Long, 1, dec!(17000)), dec!(0));
        assert_eq!(book.net(), 1);
        let delta = book.apply_fill(Side::Short, 1, dec!(17025));
        assert_eq!(delta, dec!(25));
        assert!(book.is_flat());
        assert_eq!(book.total(), dec!(25));
        assert_eq!(book.avg_entry(), dec!(0));
    }

    #[test]
    fn scale_in_averages_entry() {
        let mut book = PositionBook::new();
        book.apply_fill(Side::Long, 1, dec!(17000));
        book.apply_fill(Side::Long, 1, dec!(17010));
        assert_eq!(book.net(), 2);
        assert_eq!(book.avg_entry(), dec!(17005));
    }

    #[test]
    fn flip_through_flat_rebases_entry() {
        let mut book = PositionBook::new();
        book.apply_fill(Side::Short, 1, dec!(17000));
        let delta = book.apply_fill(Side::Long, 2, dec!(16980));
        // Short closed 20 points in profit, remainder long from the fill.
        assert_eq!(delta, dec!(20));
        assert_eq!(book.net(), 1);
        assert_eq!(book.avg_entry(), dec!(16980));
        assert_eq!(book.side(), Some(Side::Long));
    }

    #[test]
    fn mark_uses_bid_for_longs_ask_for_shorts() {
        let mut book = PositionBook::new();
        book.apply_fill(Side::Long, 1, dec!(17000));
        book.mark(dec!(17010), dec!(17012));
        assert_eq!(book.floating(), dec!(10));

        let mut short = PositionBook::new();
        short.apply_fill(Side::Short, 1, dec!(17000));
        short.mark(dec!(16988), dec!(16990));
        assert_eq!(short.floating(), dec!(10));
    }

    #[test]
    fn net_carries_the_side_sign() {
        let mut book = PositionBook::new();
        book.apply_fill(Side::Short, 3, dec!(17000));
        assert_eq!(book.net(), Side::Short.sign() * 3);
        assert_eq!(book.net(), -3);
    }

    #[test]
    fn zero_qty_fill_is_ignored() {
        let mut book = PositionBook::new();
        assert_eq!(book.apply_fill(Side::Long, 0, dec!(17000)), dec!(0));
        assert!(book.is_flat());
    }
}
