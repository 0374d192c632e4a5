use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{policy, Claims},
    constants::{COMMENTS_PAGE_SIZE, MEMBERS_PAGE_SIZE, ORGANIZATIONS_PAGE_SIZE, POSTS_PAGE_SIZE},
    db::page_offset,
    errors::{AppError, AppResult},
    models::{
        domain::{Comment, Membership, Organization, OrganizationPost, Role},
        dto::{
            request::{
                CreateCommentRequest, CreateOrganizationRequest, CreatePostRequest,
                InviteMemberRequest, OrganizationSearchParams,
            },
            response::{MemberDto, OrganizationDetail, OrganizationSummary, Page},
        },
    },
    repositories::{
        MembershipRepository, OrganizationFilter, OrganizationRepository, PostRepository,
        UserRepository,
    },
};

/// Organization plus the caller's membership record in it.
pub struct OrganizationContext {
    pub organization: Organization,
    pub membership: Option<Membership>,
}

pub struct OrganizationService {
    organizations: Arc<dyn OrganizationRepository>,
    memberships: Arc<dyn MembershipRepository>,
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl OrganizationService {
    pub fn new(
        organizations: Arc<dyn OrganizationRepository>,
        memberships: Arc<dyn MembershipRepository>,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            organizations,
            memberships,
            posts,
            users,
        }
    }

    /// The creator becomes the owner.
    pub async fn create(
        &self,
        request: CreateOrganizationRequest,
        creator: &Claims,
    ) -> AppResult<Organization> {
        request.validate()?;

        let organization = self
            .organizations
            .create(Organization::new(
                request.name.trim(),
                &request.description,
                request.is_private,
            ))
            .await?;

        self.memberships
            .create(Membership::new(
                &organization.id,
                creator.user_id(),
                &creator.username,
                Role::Owner,
            ))
            .await?;

        log::info!(
            "User {} created organization {}",
            creator.username,
            organization.id
        );
        Ok(organization)
    }

    pub async fn list(&self, params: &OrganizationSearchParams) -> AppResult<Page<OrganizationSummary>> {
        let page = params.page();
        let filter = OrganizationFilter {
            search: params.search_text().map(str::to_string),
            criteria: params.criteria,
        };

        let (listings, total) = self
            .organizations
            .list_public(
                &filter,
                page_offset(page, ORGANIZATIONS_PAGE_SIZE),
                ORGANIZATIONS_PAGE_SIZE,
            )
            .await?;

        let items = listings
            .into_iter()
            .map(|listing| OrganizationSummary {
                id: listing.organization.id,
                name: listing.organization.name,
                description: listing.organization.description,
                member_count: listing.member_count,
            })
            .collect();

        Ok(Page::new(items, page, ORGANIZATIONS_PAGE_SIZE, total))
    }

    /// Loads the organization if the caller may see it. Hidden and missing
    /// organizations are both `NotFound`.
    pub async fn visible(&self, organization_id: &str, user_id: &str) -> AppResult<OrganizationContext> {
        let organization = self
            .organizations
            .find_by_id(organization_id)
            .await?
            .ok_or_else(|| organization_not_found(organization_id))?;
        let membership = self.memberships.find(organization_id, user_id).await?;

        if !policy::can_view_organization(&organization, membership.as_ref()) {
            return Err(organization_not_found(organization_id));
        }

        Ok(OrganizationContext {
            organization,
            membership,
        })
    }

    pub async fn detail(&self, organization_id: &str, user_id: &str) -> AppResult<OrganizationDetail> {
        let context = self.visible(organization_id, user_id).await?;
        let role = context.membership.as_ref().map(|m| m.role);

        Ok(OrganizationDetail {
            is_member: context.membership.is_some(),
            is_admin: policy::is_admin(context.membership.as_ref()),
            role,
            organization: context.organization,
        })
    }

    /// Self-join as a plain member. Only public organizations accept it.
    pub async fn join(&self, organization_id: &str, user: &Claims) -> AppResult<Membership> {
        let context = self.visible(organization_id, user.user_id()).await?;
        if context.organization.is_private {
            return Err(organization_not_found(organization_id));
        }

        self.memberships
            .create(Membership::new(
                organization_id,
                user.user_id(),
                &user.username,
                Role::Member,
            ))
            .await
    }

    pub async fn members(
        &self,
        organization_id: &str,
        user_id: &str,
        page: u64,
    ) -> AppResult<Page<MemberDto>> {
        self.visible(organization_id, user_id).await?;

        let (members, total) = self
            .memberships
            .list_by_organization(
                organization_id,
                page_offset(page, MEMBERS_PAGE_SIZE),
                MEMBERS_PAGE_SIZE,
            )
            .await?;

        let items = members
            .into_iter()
            .map(|m| MemberDto {
                user_id: m.user_id,
                username: m.username,
                role: m.role,
            })
            .collect();

        Ok(Page::new(items, page, MEMBERS_PAGE_SIZE, total))
    }

    pub async fn invite(
        &self,
        organization_id: &str,
        actor_id: &str,
        request: InviteMemberRequest,
    ) -> AppResult<MemberDto> {
        request.validate()?;

        let context = self.visible(organization_id, actor_id).await?;
        if !policy::can_invite(context.membership.as_ref()) {
            return Err(AppError::PermissionDenied(
                "Only administrators can invite users".to_string(),
            ));
        }

        let invitee = self
            .users
            .find_by_username(request.username.trim())
            .await?
            .ok_or_else(|| {
                AppError::ValidationError(format!("No user named '{}'", request.username.trim()))
            })?;

        let membership = self
            .memberships
            .create(Membership::new(
                organization_id,
                &invitee.id,
                &invitee.username,
                Role::Invited,
            ))
            .await?;

        Ok(MemberDto {
            user_id: membership.user_id,
            username: membership.username,
            role: membership.role,
        })
    }

    /// Returns the removed member's username.
    pub async fn remove_member(
        &self,
        organization_id: &str,
        actor_id: &str,
        target_id: &str,
    ) -> AppResult<String> {
        let (actor, target) = self.actor_and_target(organization_id, actor_id, target_id).await?;

        if !policy::can_remove_member(&actor, &target) {
            return Err(AppError::PermissionDenied(format!(
                "You cannot remove {} from this organization",
                target.username
            )));
        }

        self.memberships.delete(organization_id, target_id).await?;
        log::info!(
            "User {} removed {} from organization {}",
            actor.username,
            target.username,
            organization_id
        );
        Ok(target.username)
    }

    /// Returns the affected member's username.
    pub async fn change_role(
        &self,
        organization_id: &str,
        actor_id: &str,
        target_id: &str,
        new_role: Role,
    ) -> AppResult<String> {
        let (actor, target) = self.actor_and_target(organization_id, actor_id, target_id).await?;

        if !policy::can_change_role(&actor, &target, new_role) {
            return Err(AppError::PermissionDenied(format!(
                "You cannot make {} {}",
                target.username, new_role
            )));
        }

        self.memberships
            .update_role(organization_id, target_id, new_role)
            .await?;
        Ok(target.username)
    }

    async fn actor_and_target(
        &self,
        organization_id: &str,
        actor_id: &str,
        target_id: &str,
    ) -> AppResult<(Membership, Membership)> {
        let context = self.visible(organization_id, actor_id).await?;
        let actor = context.membership.ok_or_else(|| {
            AppError::PermissionDenied("You are not a member of this organization".to_string())
        })?;
        let target = self
            .memberships
            .find(organization_id, target_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "User '{}' is not a member of this organization",
                    target_id
                ))
            })?;
        Ok((actor, target))
    }

    pub async fn posts(
        &self,
        organization_id: &str,
        user_id: &str,
        page: u64,
    ) -> AppResult<Page<OrganizationPost>> {
        self.visible(organization_id, user_id).await?;

        let (posts, total) = self
            .posts
            .list_posts(
                organization_id,
                page_offset(page, POSTS_PAGE_SIZE),
                POSTS_PAGE_SIZE,
            )
            .await?;

        Ok(Page::new(posts, page, POSTS_PAGE_SIZE, total))
    }

    pub async fn create_post(
        &self,
        organization_id: &str,
        user_id: &str,
        request: CreatePostRequest,
    ) -> AppResult<OrganizationPost> {
        request.validate()?;

        let context = self.visible(organization_id, user_id).await?;
        if !policy::is_admin(context.membership.as_ref()) {
            return Err(AppError::PermissionDenied(
                "Only administrators can publish posts".to_string(),
            ));
        }

        self.posts
            .create_post(OrganizationPost::new(
                organization_id,
                &request.name,
                &request.text,
            ))
            .await
    }

    pub async fn post(
        &self,
        organization_id: &str,
        post_id: &str,
        user_id: &str,
    ) -> AppResult<OrganizationPost> {
        let context = self.visible(organization_id, user_id).await?;
        let post = self
            .posts
            .find_post(post_id)
            .await?
            .filter(|post| {
                policy::can_view_post(post, &context.organization, context.membership.as_ref())
            })
            .ok_or_else(|| AppError::NotFound(format!("Post with id '{}' not found", post_id)))?;
        Ok(post)
    }

    pub async fn comments(
        &self,
        organization_id: &str,
        post_id: &str,
        user_id: &str,
        page: u64,
    ) -> AppResult<Page<Comment>> {
        let post = self.post(organization_id, post_id, user_id).await?;

        let (comments, total) = self
            .posts
            .list_comments(
                &post.id,
                page_offset(page, COMMENTS_PAGE_SIZE),
                COMMENTS_PAGE_SIZE,
            )
            .await?;

        Ok(Page::new(comments, page, COMMENTS_PAGE_SIZE, total))
    }

    /// Blank comment text is ignored and yields `None`.
    pub async fn add_comment(
        &self,
        organization_id: &str,
        post_id: &str,
        author: &Claims,
        request: CreateCommentRequest,
    ) -> AppResult<Option<Comment>> {
        let post = self.post(organization_id, post_id, author.user_id()).await?;

        let Some(text) = request
            .comment_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };

        let comment = self
            .posts
            .create_comment(Comment::new(&post.id, author.user_id(), &author.username, text))
            .await?;
        Ok(Some(comment))
    }
}

fn organization_not_found(organization_id: &str) -> AppError {
    AppError::NotFound(format!(
        "Organization with id '{}' not found",
        organization_id
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        repositories::{
            membership_repository::MockMembershipRepository,
            organization_repository::MockOrganizationRepository,
            post_repository::MockPostRepository, user_repository::MockUserRepository,
        },
        test_utils::fixtures::claims,
    };

    const ORG: &str = "org-1";

    fn organization(is_private: bool) -> Organization {
        let mut organization = Organization::new("Chess club", "", is_private);
        organization.id = ORG.to_string();
        organization
    }

    fn organizations(is_private: bool) -> MockOrganizationRepository {
        let mut repo = MockOrganizationRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(organization(is_private))));
        repo
    }

    /// Membership store holding `records` as (user_id, role).
    fn memberships(records: Vec<(&'static str, Role)>) -> MockMembershipRepository {
        let mut repo = MockMembershipRepository::new();
        repo.expect_find().returning(move |org, user| {
            Ok(records
                .iter()
                .find(|(id, _)| *id == user)
                .map(|(id, role)| Membership::new(org, id, id, *role)))
        });
        repo
    }

    fn service(
        organizations: MockOrganizationRepository,
        memberships: MockMembershipRepository,
        posts: MockPostRepository,
        users: MockUserRepository,
    ) -> OrganizationService {
        OrganizationService::new(
            Arc::new(organizations),
            Arc::new(memberships),
            Arc::new(posts),
            Arc::new(users),
        )
    }

    #[tokio::test]
    async fn test_create_makes_creator_owner() {
        let mut organizations = MockOrganizationRepository::new();
        organizations.expect_create().returning(|org| Ok(org));
        let mut memberships = MockMembershipRepository::new();
        memberships
            .expect_create()
            .withf(|m| m.user_id == "alice" && m.role == Role::Owner)
            .times(1)
            .returning(|m| Ok(m));

        let service = service(
            organizations,
            memberships,
            MockPostRepository::new(),
            MockUserRepository::new(),
        );
        let request = CreateOrganizationRequest {
            name: " Chess club ".to_string(),
            description: String::new(),
            is_private: true,
        };

        let organization = service.create(request, &claims("alice")).await.unwrap();
        assert_eq!(organization.name, "Chess club");
        assert!(organization.is_private);
    }

    #[tokio::test]
    async fn test_private_organization_is_hidden_from_outsiders() {
        let service = service(
            organizations(true),
            memberships(vec![("member", Role::Invited)]),
            MockPostRepository::new(),
            MockUserRepository::new(),
        );

        let hidden = service.detail(ORG, "stranger").await;
        assert!(matches!(hidden, Err(AppError::NotFound(_))));

        let detail = service.detail(ORG, "member").await.unwrap();
        assert!(detail.is_member);
        assert!(!detail.is_admin);
        assert_eq!(detail.role, Some(Role::Invited));
    }

    #[tokio::test]
    async fn test_join_private_organization_is_not_found() {
        let service = service(
            organizations(true),
            memberships(vec![("member", Role::Member)]),
            MockPostRepository::new(),
            MockUserRepository::new(),
        );

        let result = service.join(ORG, &claims("member")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_admin_removes_member() {
        let mut memberships = memberships(vec![("admin", Role::Admin), ("bob", Role::Member)]);
        memberships
            .expect_delete()
            .withf(|org, user| org == ORG && user == "bob")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = service(
            organizations(false),
            memberships,
            MockPostRepository::new(),
            MockUserRepository::new(),
        );

        let removed = service.remove_member(ORG, "admin", "bob").await.unwrap();
        assert_eq!(removed, "bob");
    }

    #[tokio::test]
    async fn test_member_cannot_remove_invitee() {
        let mut memberships = memberships(vec![("bob", Role::Member), ("carol", Role::Invited)]);
        memberships.expect_delete().never();

        let service = service(
            organizations(false),
            memberships,
            MockPostRepository::new(),
            MockUserRepository::new(),
        );

        let result = service.remove_member(ORG, "bob", "carol").await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_outsider_cannot_change_roles() {
        let service = service(
            organizations(false),
            memberships(vec![("bob", Role::Member)]),
            MockPostRepository::new(),
            MockUserRepository::new(),
        );

        let result = service.change_role(ORG, "stranger", "bob", Role::Admin).await;
        assert!(matches!(result, Err(AppError::PermissionDenied(_))));
    }

    #[tokio::test]
    async fn test_invite_unknown_username_is_validation_error() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));

        let service = service(
            organizations(false),
            memberships(vec![("admin", Role::Owner)]),
            MockPostRepository::new(),
            users,
        );

        let result = service
            .invite(
                ORG,
                "admin",
                InviteMemberRequest {
                    username: "ghost".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_blank_comment_is_ignored() {
        let mut posts = MockPostRepository::new();
        posts.expect_find_post().returning(|id| {
            let mut post = OrganizationPost::new(ORG, "News", "text");
            post.id = id.to_string();
            Ok(Some(post))
        });
        posts.expect_create_comment().never();

        let service = service(
            organizations(false),
            memberships(vec![]),
            posts,
            MockUserRepository::new(),
        );

        let comment = service
            .add_comment(
                ORG,
                "post-1",
                &claims("alice"),
                CreateCommentRequest {
                    comment_text: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();
        assert!(comment.is_none());
    }
}
