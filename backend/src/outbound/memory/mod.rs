//! In-memory fixture backend.
//!
//! Implements every driven port over one mutex-guarded store so the server can
//! run without a hosted project. Row-level security is approximated: writes
//! need a live session owned by the row's user, and reads are open.

mod seed;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::broadcast;
use url::Url;
use uuid::Uuid;

use crate::domain::auth::{Caller, Credentials, OAuthStart, PkceVerifier, SignUpDetails};
use crate::domain::ids::{TestimonialId, WishlistEntryId};
use crate::domain::listing::{Listing, ListingDraft, ListingId, ListingRecord, ProviderSummary};
use crate::domain::ports::{
    AuthEvent, AuthGateway, AuthGatewayError, AuthStateChannel, AvatarStorage, AvatarStorageError,
    BackendPorts, ListingDetailRecord, ListingRepository, ListingRepositoryError,
    ProfileRepository, ProfileRepositoryError, ServiceRequestRepository,
    ServiceRequestRepositoryError, SignUpOutcome, StoredObject, TestimonialRepository,
    TestimonialRepositoryError, WishlistRepository, WishlistRepositoryError,
};
use crate::domain::profile::{Profile, ProfileEdit, ProfileSeed};
use crate::domain::service_request::ServiceRequestDraft;
use crate::domain::testimonial::{Testimonial, TestimonialDraft};
use crate::domain::user::{AccessToken, AuthSession, AuthUser, RefreshToken, UserId};
use crate::domain::wishlist::WishlistEntry;

pub use seed::{FIXTURE_PASSWORD, SeedAccount};

const RLS_VIOLATION: &str = "new row violates row-level security policy";
const MIN_PASSWORD_LEN: usize = 6;
const STORAGE_BASE: &str = "https://storage.invalid/storage/v1/object/public/";

#[derive(Debug, Clone)]
struct Account {
    user: AuthUser,
    password: String,
}

#[derive(Debug, Clone)]
struct PendingCode {
    user: UserId,
    challenge: String,
}

#[derive(Debug, Clone)]
struct StoredBlob {
    content_type: String,
    bytes: Vec<u8>,
}

#[derive(Debug, Default)]
struct Store {
    accounts: Vec<Account>,
    sessions: HashMap<String, UserId>,
    codes: HashMap<String, PendingCode>,
    profiles: HashMap<UserId, Profile>,
    listings: Vec<Listing>,
    requests: Vec<ServiceRequestDraft>,
    wishlists: Vec<WishlistEntry>,
    testimonials: Vec<Testimonial>,
    objects: HashMap<(String, String), StoredBlob>,
}

impl Store {
    fn account_by_email(&self, email: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|account| account.user.email.eq_ignore_ascii_case(email))
    }

    fn account(&self, id: UserId) -> Option<&Account> {
        self.accounts.iter().find(|account| account.user.id == id)
    }

    /// The user behind the caller's token, if the session is live.
    fn signed_in(&self, caller: &Caller) -> Option<UserId> {
        let token = caller.access_token()?;
        self.sessions.get(token.expose()).copied()
    }

    fn open_session(&mut self, user: AuthUser) -> AuthSession {
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.insert(token.clone(), user.id);
        AuthSession {
            user,
            access_token: AccessToken::new(token),
            refresh_token: Some(RefreshToken::new(Uuid::new_v4().simple().to_string())),
        }
    }

    fn provider_summary(&self, id: UserId) -> Option<ProviderSummary> {
        self.profiles.get(&id).map(|profile| ProviderSummary {
            full_name: Some(profile.full_name.clone()),
            photo_url: profile.photo_url.clone(),
        })
    }

    fn with_author(&self, testimonial: &Testimonial) -> Testimonial {
        let mut joined = testimonial.clone();
        joined.author_name = self
            .profiles
            .get(&testimonial.from_user_id)
            .map(|profile| profile.full_name.clone());
        joined
    }

    fn testimonials_where(&self, keep: impl Fn(&Testimonial) -> bool) -> Vec<Testimonial> {
        let mut rows: Vec<_> = self
            .testimonials
            .iter()
            .filter(|t| keep(t))
            .map(|t| self.with_author(t))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows
    }
}

/// Every port over one shared in-memory store.
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<Mutex<Store>>,
    events: AuthStateChannel,
    clock: Arc<dyn Clock>,
    oauth_account: Option<UserId>,
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend").finish_non_exhaustive()
    }
}

impl MemoryBackend {
    /// An empty backend.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, events: AuthStateChannel) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            events,
            clock,
            oauth_account: None,
        }
    }

    /// A backend holding the demo accounts and listings.
    ///
    /// OAuth sign-ins complete as the first seeded account.
    #[must_use]
    pub fn seeded(clock: Arc<dyn Clock>, events: AuthStateChannel) -> Self {
        let backend = Self::new(clock, events);
        let first = {
            let mut store = backend.lock();
            seed::populate(&mut store, backend.clock.utc())
        };
        backend.with_oauth_account(first)
    }

    /// Complete OAuth sign-ins as `id`.
    #[must_use]
    pub fn with_oauth_account(mut self, id: Option<UserId>) -> Self {
        self.oauth_account = id;
        self
    }

    /// Register an account with a confirmed email and a profile row.
    pub fn add_account(&self, account: &SeedAccount) -> AuthUser {
        let mut store = self.lock();
        seed::insert_account(&mut store, account)
    }

    /// Every port backed by this store.
    #[must_use]
    pub fn ports(&self) -> BackendPorts {
        let shared = Arc::new(self.clone());
        BackendPorts {
            auth: shared.clone(),
            profiles: shared.clone(),
            listings: shared.clone(),
            requests: shared.clone(),
            wishlists: shared.clone(),
            testimonials: shared.clone(),
            storage: shared,
        }
    }

    /// Number of service requests recorded.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.lock().requests.len()
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AuthGateway for MemoryBackend {
    async fn sign_up(&self, details: &SignUpDetails) -> Result<SignUpOutcome, AuthGatewayError> {
        let email = details.credentials.email();
        if details.credentials.password().chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthGatewayError::invalid_request(
                "Password should be at least 6 characters.",
            ));
        }
        let session = {
            let mut store = self.lock();
            if store.account_by_email(email).is_some() {
                return Err(AuthGatewayError::invalid_request("User already registered"));
            }
            let user = AuthUser {
                id: UserId::random(),
                email: email.to_owned(),
                full_name: details.full_name.trim().to_owned(),
            };
            store.accounts.push(Account {
                user: user.clone(),
                password: details.credentials.password().to_owned(),
            });
            store.open_session(user)
        };
        self.events.publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(SignUpOutcome::SignedIn(session))
    }

    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthGatewayError> {
        let session = {
            let mut store = self.lock();
            let user = store
                .account_by_email(credentials.email())
                .filter(|account| account.password == credentials.password())
                .map(|account| account.user.clone())
                .ok_or_else(|| AuthGatewayError::rejected("Invalid login credentials"))?;
            store.open_session(user)
        };
        self.events.publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    fn oauth_authorize_url(&self, start: &OAuthStart) -> Result<Url, AuthGatewayError> {
        let user = self
            .oauth_account
            .ok_or_else(|| AuthGatewayError::invalid_request("provider is not enabled"))?;
        let code = Uuid::new_v4().simple().to_string();
        self.lock().codes.insert(
            code.clone(),
            PendingCode {
                user,
                challenge: start.code_challenge.clone(),
            },
        );
        let mut url = start.redirect_to.clone();
        url.query_pairs_mut().append_pair("code", &code);
        Ok(url)
    }

    async fn exchange_code_for_session(
        &self,
        code: &str,
        verifier: &PkceVerifier,
    ) -> Result<AuthSession, AuthGatewayError> {
        let session = {
            let mut store = self.lock();
            let pending = store
                .codes
                .remove(code)
                .ok_or_else(|| AuthGatewayError::rejected("invalid flow state"))?;
            if pending.challenge != verifier.challenge() {
                return Err(AuthGatewayError::rejected(
                    "code challenge does not match previously saved code verifier",
                ));
            }
            let user = store
                .account(pending.user)
                .map(|account| account.user.clone())
                .ok_or_else(|| AuthGatewayError::rejected("user not found"))?;
            store.open_session(user)
        };
        self.events.publish(AuthEvent::SignedIn(session.user.clone()));
        Ok(session)
    }

    async fn current_user(
        &self,
        token: &AccessToken,
    ) -> Result<Option<AuthUser>, AuthGatewayError> {
        let store = self.lock();
        Ok(store
            .sessions
            .get(token.expose())
            .and_then(|id| store.account(*id))
            .map(|account| account.user.clone()))
    }

    async fn sign_out(&self, token: &AccessToken) -> Result<(), AuthGatewayError> {
        let user = self.lock().sessions.remove(token.expose());
        self.events.publish(AuthEvent::SignedOut(user));
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl ProfileRepository for MemoryBackend {
    async fn find(
        &self,
        _caller: &Caller,
        id: &UserId,
    ) -> Result<Option<Profile>, ProfileRepositoryError> {
        Ok(self.lock().profiles.get(id).cloned())
    }

    async fn upsert_seed(
        &self,
        caller: &Caller,
        seed: &ProfileSeed,
    ) -> Result<(), ProfileRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) != Some(seed.id) {
            return Err(ProfileRepositoryError::rejected(RLS_VIOLATION));
        }
        let profile = store.profiles.entry(seed.id).or_insert_with(|| Profile {
            id: seed.id,
            full_name: String::new(),
            email: String::new(),
            about_me: None,
            contact_info: None,
            photo_url: None,
        });
        profile.email.clone_from(&seed.email);
        profile.full_name.clone_from(&seed.full_name);
        Ok(())
    }

    async fn update(
        &self,
        caller: &Caller,
        id: &UserId,
        edit: &ProfileEdit,
    ) -> Result<(), ProfileRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) != Some(*id) {
            return Err(ProfileRepositoryError::unauthorized("login required"));
        }
        if let Some(profile) = store.profiles.get_mut(id) {
            profile.apply(edit);
        }
        Ok(())
    }

    async fn set_photo_url(
        &self,
        caller: &Caller,
        id: &UserId,
        url: &Url,
    ) -> Result<(), ProfileRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) != Some(*id) {
            return Err(ProfileRepositoryError::unauthorized("login required"));
        }
        if let Some(profile) = store.profiles.get_mut(id) {
            profile.photo_url = Some(url.to_string());
        }
        Ok(())
    }
}

fn newest_first(listings: &mut [Listing]) {
    listings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl ListingRepository for MemoryBackend {
    async fn list_with_provider_and_ratings(
        &self,
        _caller: &Caller,
    ) -> Result<Vec<ListingRecord>, ListingRepositoryError> {
        let store = self.lock();
        let mut listings = store.listings.clone();
        newest_first(&mut listings);
        Ok(listings
            .into_iter()
            .map(|listing| ListingRecord {
                provider: store.provider_summary(listing.provider_id),
                ratings: Some(
                    store
                        .testimonials
                        .iter()
                        .filter(|t| t.service_id == Some(listing.id))
                        .map(|t| t.rating)
                        .collect(),
                ),
                listing,
            })
            .collect())
    }

    async fn find_detail(
        &self,
        _caller: &Caller,
        id: &ListingId,
    ) -> Result<Option<ListingDetailRecord>, ListingRepositoryError> {
        let store = self.lock();
        Ok(store
            .listings
            .iter()
            .find(|listing| listing.id == *id)
            .map(|listing| ListingDetailRecord {
                listing: listing.clone(),
                provider: store.profiles.get(&listing.provider_id).cloned(),
            }))
    }

    async fn list_by_provider(
        &self,
        _caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Listing>, ListingRepositoryError> {
        let mut listings: Vec<_> = self
            .lock()
            .listings
            .iter()
            .filter(|listing| listing.provider_id == *provider_id)
            .cloned()
            .collect();
        newest_first(&mut listings);
        Ok(listings)
    }

    async fn insert(
        &self,
        caller: &Caller,
        provider_id: &UserId,
        draft: &ListingDraft,
    ) -> Result<(), ListingRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock();
        if store.signed_in(caller) != Some(*provider_id) {
            return Err(ListingRepositoryError::rejected(RLS_VIOLATION));
        }
        store.listings.push(Listing {
            id: ListingId::random(),
            provider_id: *provider_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            category: draft.category,
            hourly_rate: draft.hourly_rate,
            availability: draft.availability.clone(),
            created_at: now,
        });
        Ok(())
    }

    async fn delete(&self, caller: &Caller, id: &ListingId) -> Result<(), ListingRepositoryError> {
        let mut store = self.lock();
        let owner = store.signed_in(caller);
        store
            .listings
            .retain(|listing| !(listing.id == *id && Some(listing.provider_id) == owner));
        Ok(())
    }
}

#[async_trait]
impl ServiceRequestRepository for MemoryBackend {
    async fn insert(
        &self,
        caller: &Caller,
        draft: &ServiceRequestDraft,
    ) -> Result<(), ServiceRequestRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) != Some(draft.requester_id) {
            return Err(ServiceRequestRepositoryError::rejected(RLS_VIOLATION));
        }
        store.requests.push(draft.clone());
        Ok(())
    }
}

#[async_trait]
impl WishlistRepository for MemoryBackend {
    async fn list_for_user(
        &self,
        caller: &Caller,
        user_id: &UserId,
    ) -> Result<Vec<WishlistEntry>, WishlistRepositoryError> {
        let store = self.lock();
        if store.signed_in(caller) != Some(*user_id) {
            return Ok(Vec::new());
        }
        Ok(store
            .wishlists
            .iter()
            .filter(|entry| entry.user_id == *user_id)
            .map(|entry| {
                let provider = store.profiles.get(&entry.provider_id);
                WishlistEntry {
                    provider_name: provider.map(|p| p.full_name.clone()),
                    provider_email: provider.map(|p| p.email.clone()),
                    ..entry.clone()
                }
            })
            .collect())
    }

    async fn find(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<Option<WishlistEntryId>, WishlistRepositoryError> {
        let store = self.lock();
        if store.signed_in(caller) != Some(*user_id) {
            return Ok(None);
        }
        Ok(store
            .wishlists
            .iter()
            .find(|entry| entry.user_id == *user_id && entry.provider_id == *provider_id)
            .map(|entry| entry.id))
    }

    async fn add(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) != Some(*user_id) {
            return Err(WishlistRepositoryError::rejected(RLS_VIOLATION));
        }
        store.wishlists.push(WishlistEntry {
            id: WishlistEntryId::random(),
            user_id: *user_id,
            provider_id: *provider_id,
            provider_name: None,
            provider_email: None,
        });
        Ok(())
    }

    async fn remove_provider(
        &self,
        caller: &Caller,
        user_id: &UserId,
        provider_id: &UserId,
    ) -> Result<(), WishlistRepositoryError> {
        let mut store = self.lock();
        if store.signed_in(caller) == Some(*user_id) {
            store
                .wishlists
                .retain(|entry| !(entry.user_id == *user_id && entry.provider_id == *provider_id));
        }
        Ok(())
    }

    async fn remove(
        &self,
        caller: &Caller,
        id: &WishlistEntryId,
    ) -> Result<(), WishlistRepositoryError> {
        let mut store = self.lock();
        let owner = store.signed_in(caller);
        store
            .wishlists
            .retain(|entry| !(entry.id == *id && Some(entry.user_id) == owner));
        Ok(())
    }
}

#[async_trait]
impl TestimonialRepository for MemoryBackend {
    async fn list_for_listing(
        &self,
        _caller: &Caller,
        listing_id: &ListingId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError> {
        Ok(self
            .lock()
            .testimonials_where(|t| t.service_id == Some(*listing_id)))
    }

    async fn list_for_provider(
        &self,
        _caller: &Caller,
        provider_id: &UserId,
    ) -> Result<Vec<Testimonial>, TestimonialRepositoryError> {
        Ok(self
            .lock()
            .testimonials_where(|t| t.to_user_id == *provider_id))
    }

    async fn insert(
        &self,
        caller: &Caller,
        draft: &TestimonialDraft,
    ) -> Result<(), TestimonialRepositoryError> {
        let now = self.clock.utc();
        let mut store = self.lock();
        if store.signed_in(caller) != Some(draft.from_user_id) {
            return Err(TestimonialRepositoryError::rejected(RLS_VIOLATION));
        }
        store.testimonials.push(Testimonial {
            id: TestimonialId::random(),
            rating: draft.rating,
            comment: draft.comment.clone(),
            from_user_id: draft.from_user_id,
            to_user_id: draft.to_user_id,
            service_id: draft.service_id,
            created_at: now,
            author_name: None,
        });
        Ok(())
    }
}

#[async_trait]
impl AvatarStorage for MemoryBackend {
    async fn upload(
        &self,
        caller: &Caller,
        object: &StoredObject,
    ) -> Result<(), AvatarStorageError> {
        let mut store = self.lock();
        let Some(owner) = store.signed_in(caller) else {
            return Err(AvatarStorageError::unauthorized("login required"));
        };
        if !object.path.starts_with(&format!("{owner}/")) {
            return Err(AvatarStorageError::rejected(RLS_VIOLATION));
        }
        let key = (object.bucket.clone(), object.path.clone());
        if !object.overwrite && store.objects.contains_key(&key) {
            return Err(AvatarStorageError::rejected("The resource already exists"));
        }
        store.objects.insert(
            key,
            StoredBlob {
                content_type: object.content_type.clone(),
                bytes: object.bytes.clone(),
            },
        );
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<Url, AvatarStorageError> {
        Url::parse(STORAGE_BASE)
            .and_then(|base| base.join(&format!("{bucket}/{path}")))
            .map_err(|_| AvatarStorageError::invalid_path(path))
    }
}

impl MemoryBackend {
    /// Content type and size of a stored object, if present.
    #[must_use]
    pub fn object_info(&self, bucket: &str, path: &str) -> Option<(String, usize)> {
        self.lock()
            .objects
            .get(&(bucket.to_owned(), path.to_owned()))
            .map(|blob| (blob.content_type.clone(), blob.bytes.len()))
    }
}
