use std::fmt::Debug;

use log::*;
use plateful_common::Money;

use crate::{
    core_api::{
        order_objects::{OrderQueryFilter, OrderWithLines},
        pricing::{self, PricedLine},
    },
    db_types::{DeliveryInfo, NewOrder, Order, OrderId, OrderLineSpec, OrderStatusType, Principal, RestaurantId},
    events::{EventProducers, OrderAnnulledEvent, OrderCreatedEvent, OrderStatusChangedEvent},
    traits::{OrderGatewayDatabase, OrderGatewayError},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: placing orders, progressing them through fulfilment,
/// and cancelling them. Authorization happens here, against the calling [`Principal`]; atomicity happens one layer
/// down, in the [`OrderGatewayDatabase`] implementation.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderGatewayDatabase
{
    /// Places a new order on behalf of the calling principal.
    ///
    /// Customers and admins order against their own account and wallet; operators have no customer wallet and are
    /// rejected. The lines are priced against the live catalog, the wallet is debited for the exact total, and the
    /// order is persisted with per-line price snapshots, all in a single transaction. On success the order-created
    /// hook fires.
    pub async fn place_order(
        &self,
        who: &Principal,
        restaurant_id: RestaurantId,
        delivery: DeliveryInfo,
        lines: Vec<OrderLineSpec>,
    ) -> Result<OrderWithLines, OrderGatewayError> {
        let account_id = who
            .account_id()
            .ok_or_else(|| OrderGatewayError::Forbidden(format!("{who} cannot place orders")))?;
        let order =
            NewOrder { account_id, ledger_key: who.ledger_key(), restaurant_id, delivery, lines };
        let (order, lines) = self.db.create_order(order).await?;
        debug!("🔄️📦️ Order {} created for {who} at restaurant {restaurant_id}, total {}", order.order_number, order.total_price);
        self.call_order_created_hook(&order).await;
        Ok(OrderWithLines { order, lines })
    }

    /// Prices a prospective order without placing it. Open to any caller; no wallet is touched.
    pub async fn quote(
        &self,
        restaurant_id: RestaurantId,
        lines: &[OrderLineSpec],
    ) -> Result<(Money, Vec<PricedLine>), OrderGatewayError> {
        if self.db.fetch_restaurant(restaurant_id).await?.filter(|r| r.is_active).is_none() {
            return Err(OrderGatewayError::RestaurantNotFound(restaurant_id));
        }
        pricing::quote_order(&self.db, restaurant_id, lines).await
    }

    /// Cancels an order and refunds its total to the owner's wallet, atomically.
    ///
    /// Only the order's owner or an admin may cancel. Orders in a terminal state cannot be cancelled. On success the
    /// order-annulled hook fires.
    pub async fn cancel_order(&self, who: &Principal, id: OrderId) -> Result<Order, OrderGatewayError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderGatewayError::OrderNotFound(id))?;
        let is_owner = who.account_id().map(|acct| acct == order.account_id).unwrap_or(false);
        if !(is_owner || who.is_admin()) {
            return Err(OrderGatewayError::Forbidden(format!("{who} may not cancel order {id}")));
        }
        let order = self.db.cancel_order(id).await?;
        info!("🔄️❌️ Order {} cancelled by {who}; {} refunded", order.order_number, order.total_price);
        self.call_order_annulled_hook(&order).await;
        Ok(order)
    }

    /// Moves an order one or more steps forward along the fulfilment pipeline.
    ///
    /// Admins may progress any order; an operator only orders of their own restaurant. A `Cancelled` target is routed
    /// through [`Self::cancel_order`]'s semantics so that the refund can never be skipped; all other targets must be
    /// strictly forward of the current status.
    pub async fn update_status(
        &self,
        who: &Principal,
        id: OrderId,
        status: OrderStatusType,
    ) -> Result<Order, OrderGatewayError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderGatewayError::OrderNotFound(id))?;
        let runs_restaurant = who.restaurant_id().map(|r| r == order.restaurant_id).unwrap_or(false);
        if !(runs_restaurant || who.is_admin()) {
            return Err(OrderGatewayError::Forbidden(format!("{who} may not update order {id}")));
        }
        if status == OrderStatusType::Cancelled {
            let order = self.db.cancel_order(id).await?;
            info!("🔄️❌️ Order {} cancelled by {who}; {} refunded", order.order_number, order.total_price);
            self.call_order_annulled_hook(&order).await;
            return Ok(order);
        }
        let old_status = order.status;
        let order = self.db.update_order_status(id, status).await?;
        debug!("🔄️📦️ Order {} moved from {old_status} to {} by {who}", order.order_number, order.status);
        self.call_status_changed_hook(old_status, &order).await;
        Ok(order)
    }

    /// Fetches an order with its lines. Visible to the owner, the restaurant's operator, and admins.
    pub async fn order_with_lines(&self, who: &Principal, id: OrderId) -> Result<OrderWithLines, OrderGatewayError> {
        let order = self.db.fetch_order(id).await?.ok_or(OrderGatewayError::OrderNotFound(id))?;
        let is_owner = who.account_id().map(|acct| acct == order.account_id).unwrap_or(false);
        let runs_restaurant = who.restaurant_id().map(|r| r == order.restaurant_id).unwrap_or(false);
        if !(is_owner || runs_restaurant || who.is_admin()) {
            return Err(OrderGatewayError::Forbidden(format!("{who} may not view order {id}")));
        }
        let lines = self.db.fetch_order_lines(id).await?;
        Ok(OrderWithLines { order, lines })
    }

    /// Searches orders. The filter is silently narrowed to what the caller may see: customers to their own orders,
    /// operators to their restaurant's orders. Admins search unscoped.
    pub async fn search_orders(
        &self,
        who: &Principal,
        mut query: OrderQueryFilter,
    ) -> Result<Vec<Order>, OrderGatewayError> {
        match who {
            Principal::Admin(_) => {},
            Principal::Customer(acct) => query.account_id = Some(*acct),
            Principal::Operator(rest) => query.restaurant_id = Some(*rest),
        }
        trace!("🔄️📦️ {who} searching orders: {query}");
        let orders = self.db.search_orders(query).await?;
        Ok(orders)
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️❌️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    async fn call_status_changed_hook(&self, old_status: OrderStatusType, order: &Order) {
        for emitter in &self.producers.status_changed_producer {
            debug!("🔄️📦️ Notifying status changed hook subscribers");
            emitter.publish_event(OrderStatusChangedEvent::new(old_status, order.clone())).await;
        }
    }
}
