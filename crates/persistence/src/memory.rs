//! In-memory implementation of every store trait.
//!
//! Applies the same rules as the Postgres repositories (join-row planning,
//! cascades, foreign-key checks, rating recomputation) so the API can run
//! and be tested without a database. Each operation holds the lock for its
//! whole duration, which gives it the atomicity of a transaction.

use async_trait::async_trait;
use chrono::Utc;
use domain::models::association::{plan_links, AssociationLink, AssociationWrites};
use domain::models::booking::{BookingFilter, BookingRequest, BookingStatus, NewBooking};
use domain::models::price_component::{NewPriceComponent, PriceComponent};
use domain::models::reference::{
    NewReference, ReferenceChanges, ReferenceFilter, ReferenceItem, ReferenceKind,
};
use domain::models::review::{rating_summary, NewReview, Review, ReviewFilter};
use domain::models::tour::{
    check_publishable, LinkedReference, PublishError, Tour, TourChanges, TourDetails, TourDraft,
    TourListFilter,
};
use domain::store::{
    BookingStore, PriceComponentStore, ReferenceStore, ReviewStore, StoreError, StoreResult,
    TourStore,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    next_id: i64,
    tours: BTreeMap<i64, Tour>,
    links: HashMap<(i64, ReferenceKind), Vec<AssociationLink>>,
    references: HashMap<ReferenceKind, BTreeMap<i64, ReferenceItem>>,
    bookings: BTreeMap<i64, BookingRequest>,
    reviews: BTreeMap<i64, Review>,
    price_components: BTreeMap<String, PriceComponent>,
}

impl MemoryState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn reference(&self, kind: ReferenceKind, id: i64) -> Option<&ReferenceItem> {
        self.references.get(&kind).and_then(|items| items.get(&id))
    }

    fn details(&self, tour: &Tour) -> TourDetails {
        let mut links = BTreeMap::new();
        for kind in ReferenceKind::ALL {
            let Some(rows) = self.links.get(&(tour.id, kind)) else {
                continue;
            };
            if rows.is_empty() {
                continue;
            }
            let mut rows = rows.clone();
            rows.sort_by_key(|row| row.position);
            let linked = rows
                .into_iter()
                .map(|link| LinkedReference {
                    link,
                    item: self.reference(kind, link.target_id).cloned(),
                })
                .collect();
            links.insert(kind, linked);
        }
        TourDetails {
            tour: tour.clone(),
            links,
        }
    }

    fn details_by_id(&self, id: i64) -> Option<TourDetails> {
        self.tours.get(&id).map(|tour| self.details(tour))
    }

    fn has_link(&self, tour_id: i64, kind: ReferenceKind, target_id: i64) -> bool {
        self.links
            .get(&(tour_id, kind))
            .map_or(false, |rows| rows.iter().any(|row| row.target_id == target_id))
    }

    /// Foreign-key check for every id a write introduces.
    fn check_link_targets(&self, writes: &AssociationWrites) -> StoreResult<()> {
        for (kind, write) in writes {
            for id in write.target_ids() {
                if self.reference(*kind, id).is_none() {
                    return Err(StoreError::InvalidReference(format!(
                        "{} {} does not exist",
                        kind.display_name(),
                        id
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_link_writes(&mut self, tour_id: i64, writes: &AssociationWrites) {
        for (kind, write) in writes {
            let existing = self
                .links
                .get(&(tour_id, *kind))
                .cloned()
                .unwrap_or_default();
            if let Some(rows) = plan_links(&existing, write) {
                self.links.insert((tour_id, *kind), rows);
            }
        }
    }

    fn recompute_rating(&mut self, tour_id: i64) {
        let reviews: Vec<Review> = self
            .reviews
            .values()
            .filter(|review| review.tour_id == tour_id)
            .cloned()
            .collect();
        let (rating, count) = rating_summary(&reviews);
        if let Some(tour) = self.tours.get_mut(&tour_id) {
            tour.rating = rating;
            tour.reviews_count = count;
            tour.updated_at = Utc::now();
        }
    }
}

/// Store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[async_trait]
impl TourStore for InMemoryStore {
    async fn list_tours(&self, filter: &TourListFilter) -> StoreResult<(Vec<TourDetails>, i64)> {
        let state = self.state.read().await;

        let mut matching: Vec<&Tour> = state
            .tours
            .values()
            .filter(|tour| filter.include_drafts || !tour.is_draft)
            .filter(|tour| {
                filter
                    .country_id
                    .map_or(true, |id| state.has_link(tour.id, ReferenceKind::Country, id))
            })
            .filter(|tour| {
                filter
                    .category_id
                    .map_or(true, |id| state.has_link(tour.id, ReferenceKind::Category, id))
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as i64;
        let tours = page(
            matching.into_iter().map(|tour| state.details(tour)),
            filter.limit,
            filter.offset,
        );
        Ok((tours, total))
    }

    async fn find_tour(&self, id: i64) -> StoreResult<Option<TourDetails>> {
        Ok(self.state.read().await.details_by_id(id))
    }

    async fn create_tour(
        &self,
        draft: TourDraft,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails> {
        let mut state = self.state.write().await;
        state.check_link_targets(&links)?;

        let id = state.next_id();
        let now = Utc::now();
        let tour = Tour {
            id,
            title: draft.title,
            description: draft.description,
            short_description: draft.short_description,
            price: draft.price,
            price_type: draft.price_type,
            duration_days: draft.duration_days,
            is_draft: draft.is_draft,
            is_active: !draft.is_draft,
            services: draft.services,
            itinerary: draft.itinerary,
            images: draft.images,
            map_points: draft.map_points,
            rating: 0.0,
            reviews_count: 0,
            created_at: now,
            updated_at: now,
        };
        state.tours.insert(id, tour);
        state.apply_link_writes(id, &links);

        state
            .details_by_id(id)
            .ok_or_else(|| StoreError::NotFound("Tour".to_string()))
    }

    async fn update_tour(
        &self,
        id: i64,
        changes: TourChanges,
        links: AssociationWrites,
    ) -> StoreResult<TourDetails> {
        let mut state = self.state.write().await;
        if !state.tours.contains_key(&id) {
            return Err(StoreError::NotFound("Tour".to_string()));
        }
        state.check_link_targets(&links)?;

        if let Some(tour) = state.tours.get_mut(&id) {
            if let Some(title) = changes.title {
                tour.title = title;
            }
            if let Some(description) = changes.description {
                tour.description = description;
            }
            if let Some(short_description) = changes.short_description {
                tour.short_description = Some(short_description);
            }
            if let Some(price) = changes.price {
                tour.price = price;
            }
            if let Some(price_type) = changes.price_type {
                tour.price_type = price_type;
            }
            if let Some(duration_days) = changes.duration_days {
                tour.duration_days = duration_days;
            }
            if let Some(services) = changes.services {
                tour.services = services;
            }
            if let Some(itinerary) = changes.itinerary {
                tour.itinerary = itinerary;
            }
            if let Some(images) = changes.images {
                tour.images = images;
            }
            if let Some(map_points) = changes.map_points {
                tour.map_points = map_points;
            }
            tour.updated_at = Utc::now();
        }
        state.apply_link_writes(id, &links);

        state
            .details_by_id(id)
            .ok_or_else(|| StoreError::NotFound("Tour".to_string()))
    }

    async fn publish_tour(&self, id: i64) -> StoreResult<Result<TourDetails, PublishError>> {
        let mut state = self.state.write().await;
        let details = state
            .details_by_id(id)
            .ok_or_else(|| StoreError::NotFound("Tour".to_string()))?;

        if let Err(rejected) = check_publishable(&details) {
            return Ok(Err(rejected));
        }

        if let Some(tour) = state.tours.get_mut(&id) {
            tour.is_draft = false;
            tour.is_active = true;
            tour.updated_at = Utc::now();
        }
        state
            .details_by_id(id)
            .map(Ok)
            .ok_or_else(|| StoreError::NotFound("Tour".to_string()))
    }

    async fn delete_tour(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if !state.tours.contains_key(&id) {
            return Ok(false);
        }
        if state.bookings.values().any(|booking| booking.tour_id == id) {
            return Err(StoreError::Conflict("Tour has booking requests".to_string()));
        }

        state.tours.remove(&id);
        state.links.retain(|(tour_id, _), _| *tour_id != id);
        state.reviews.retain(|_, review| review.tour_id != id);
        Ok(true)
    }
}

#[async_trait]
impl ReferenceStore for InMemoryStore {
    async fn list_references(
        &self,
        kind: ReferenceKind,
        filter: &ReferenceFilter,
    ) -> StoreResult<Vec<ReferenceItem>> {
        let state = self.state.read().await;
        Ok(state
            .references
            .get(&kind)
            .map(|items| {
                items
                    .values()
                    .filter(|item| filter.include_inactive || item.is_active)
                    .filter(|item| filter.parent_id.map_or(true, |p| item.parent_id == Some(p)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_reference(
        &self,
        kind: ReferenceKind,
        id: i64,
    ) -> StoreResult<Option<ReferenceItem>> {
        Ok(self.state.read().await.reference(kind, id).cloned())
    }

    async fn parent_ids(
        &self,
        kind: ReferenceKind,
        ids: &[i64],
    ) -> StoreResult<Vec<(i64, Option<i64>)>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.reference(kind, *id))
            .map(|item| (item.id, item.parent_id))
            .collect())
    }

    async fn create_reference(
        &self,
        kind: ReferenceKind,
        new: NewReference,
    ) -> StoreResult<ReferenceItem> {
        let mut state = self.state.write().await;
        if let (Some(parent_kind), Some(parent_id)) = (kind.parent_kind(), new.parent_id) {
            if state.reference(parent_kind, parent_id).is_none() {
                return Err(StoreError::InvalidReference(format!(
                    "{} {} does not exist",
                    parent_kind.display_name(),
                    parent_id
                )));
            }
        }

        let id = state.next_id();
        let now = Utc::now();
        let item = ReferenceItem {
            id,
            kind,
            name: new.name,
            description: new.description,
            address: new.address,
            parent_id: new.parent_id,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };
        state
            .references
            .entry(kind)
            .or_default()
            .insert(id, item.clone());
        Ok(item)
    }

    async fn update_reference(
        &self,
        kind: ReferenceKind,
        id: i64,
        changes: ReferenceChanges,
    ) -> StoreResult<ReferenceItem> {
        let mut state = self.state.write().await;
        if let (Some(parent_kind), Some(parent_id)) = (kind.parent_kind(), changes.parent_id) {
            if state.reference(parent_kind, parent_id).is_none() {
                return Err(StoreError::InvalidReference(format!(
                    "{} {} does not exist",
                    parent_kind.display_name(),
                    parent_id
                )));
            }
        }

        let item = state
            .references
            .get_mut(&kind)
            .and_then(|items| items.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound(kind.display_name().to_string()))?;

        if let Some(name) = changes.name {
            item.name = name;
        }
        if let Some(address) = changes.address {
            item.address = Some(address);
        }
        if let Some(description) = changes.description {
            item.description = Some(description);
        }
        if let Some(parent_id) = changes.parent_id {
            item.parent_id = Some(parent_id);
        }
        if let Some(is_active) = changes.is_active {
            item.is_active = is_active;
        }
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete_reference(&self, kind: ReferenceKind, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.reference(kind, id).is_none() {
            return Ok(false);
        }

        let has_children = ReferenceKind::ALL
            .iter()
            .filter(|child| child.parent_kind() == Some(kind))
            .any(|child| {
                state.references.get(child).map_or(false, |items| {
                    items.values().any(|item| item.parent_id == Some(id))
                })
            });
        if has_children {
            return Err(StoreError::Conflict(format!(
                "{} is still referenced by other records",
                kind.display_name()
            )));
        }

        if let Some(items) = state.references.get_mut(&kind) {
            items.remove(&id);
        }
        for ((_, link_kind), rows) in state.links.iter_mut() {
            if *link_kind == kind {
                rows.retain(|row| row.target_id != id);
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn create_booking(&self, new: NewBooking) -> StoreResult<BookingRequest> {
        let mut state = self.state.write().await;
        let submission = new.submission;
        if !state.tours.contains_key(&submission.tour_id) {
            return Err(StoreError::InvalidReference(format!(
                "Tour {} does not exist",
                submission.tour_id
            )));
        }

        let id = state.next_id();
        let now = Utc::now();
        let booking = BookingRequest {
            id,
            tour_id: submission.tour_id,
            customer_name: submission.customer_name,
            customer_email: submission.customer_email,
            customer_phone: submission.customer_phone,
            preferred_date: submission.preferred_date,
            number_of_people: submission.number_of_people,
            notes: submission.notes,
            total_price: new.total_price,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(id, booking.clone());
        Ok(booking)
    }

    async fn list_bookings(&self, filter: &BookingFilter) -> StoreResult<Vec<BookingRequest>> {
        let state = self.state.read().await;
        let mut matching: Vec<&BookingRequest> = state
            .bookings
            .values()
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| filter.tour_id.map_or(true, |t| b.tour_id == t))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(matching.into_iter().cloned(), filter.limit, filter.offset))
    }

    async fn find_booking(&self, id: i64) -> StoreResult<Option<BookingRequest>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn set_booking_status(
        &self,
        id: i64,
        status: BookingStatus,
    ) -> StoreResult<BookingRequest> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Booking request".to_string()))?;
        booking.status = status;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn create_review(&self, new: NewReview) -> StoreResult<Review> {
        let mut state = self.state.write().await;
        if !state.tours.contains_key(&new.tour_id) {
            return Err(StoreError::InvalidReference(format!(
                "Tour {} does not exist",
                new.tour_id
            )));
        }

        let id = state.next_id();
        let now = Utc::now();
        let review = Review {
            id,
            tour_id: new.tour_id,
            author_name: new.author_name,
            rating: new.rating,
            text: new.text,
            is_moderated: false,
            created_at: now,
            updated_at: now,
        };
        state.reviews.insert(id, review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, filter: &ReviewFilter) -> StoreResult<Vec<Review>> {
        let state = self.state.read().await;
        let mut matching: Vec<&Review> = state
            .reviews
            .values()
            .filter(|r| filter.tour_id.map_or(true, |t| r.tour_id == t))
            .filter(|r| filter.moderated.map_or(true, |m| r.is_moderated == m))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page(matching.into_iter().cloned(), filter.limit, filter.offset))
    }

    async fn set_review_moderation(&self, id: i64, is_moderated: bool) -> StoreResult<Review> {
        let mut state = self.state.write().await;
        let review = state
            .reviews
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound("Review".to_string()))?;
        review.is_moderated = is_moderated;
        review.updated_at = Utc::now();
        let review = review.clone();

        state.recompute_rating(review.tour_id);
        Ok(review)
    }
}

#[async_trait]
impl PriceComponentStore for InMemoryStore {
    async fn list_price_components(&self) -> StoreResult<Vec<PriceComponent>> {
        let state = self.state.read().await;
        let mut components: Vec<PriceComponent> =
            state.price_components.values().cloned().collect();
        components.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.key.cmp(&b.key)));
        Ok(components)
    }

    async fn upsert_price_component(&self, new: NewPriceComponent) -> StoreResult<PriceComponent> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let existing = state
            .price_components
            .get(&new.key)
            .map(|component| (component.id, component.created_at));
        let (id, created_at) = match existing {
            Some(kept) => kept,
            None => (state.next_id(), now),
        };

        let component = PriceComponent {
            id,
            key: new.key,
            name: new.name,
            price: new.price,
            unit: new.unit,
            category: new.category,
            sort_order: new.sort_order,
            created_at,
            updated_at: now,
        };
        state
            .price_components
            .insert(component.key.clone(), component.clone());
        Ok(component)
    }

    async fn delete_price_component(&self, key: &str) -> StoreResult<bool> {
        Ok(self
            .state
            .write()
            .await
            .price_components
            .remove(key)
            .is_some())
    }
}
