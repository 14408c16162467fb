// Post views - feeds, post pages, submission forms and follows

use axum::{
    extract::{OriginalUri, Path, Query, State},
    response::{Html, IntoResponse, Response},
    Form,
};
use tracing::info;

use super::{parse_id, post_detail_url, profile_url, PageParams, ViewResponse};
use crate::app_state::AppState;
use crate::error::{AppError, AppResult};
use crate::forms::{CommentForm, PostForm, PostFormData};
use crate::infrastructure::media::POST_IMAGE_DIR;
use crate::infrastructure::middleware::{CurrentUser, Vc};
use crate::infrastructure::page_cache::PageCache;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{Group, NewPost, Post, PostScope, User};
use crate::paginator::paginate_posts;
use crate::templates::TemplateResponse;

pub const INDEX_CACHE_PREFIX: &str = "index_page";

async fn get_author(state: &AppState, username: &str) -> AppResult<User> {
    state
        .db
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user named {}", username)))
}

async fn get_post(state: &AppState, post_id: i64) -> AppResult<Post> {
    state
        .db
        .get_post(post_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No post with id {}", post_id)))
}

/// Context of the home feed.
pub async fn index_page(
    state: &AppState,
    viewer: &ViewerContext,
    page: Option<&str>,
) -> AppResult<TemplateResponse> {
    let page_obj = paginate_posts(state.db.as_ref(), PostScope::All, page, state.posts_per_page())
        .await?;
    Ok(TemplateResponse::new("posts/index.html", viewer).insert("page_obj", &page_obj))
}

/// Home feed. The rendered body is served from the page cache until it
/// expires, even if posts change meanwhile.
pub async fn index(
    State(state): State<AppState>,
    vc: Vc,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<PageParams>,
) -> AppResult<Response> {
    let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let key = PageCache::key(INDEX_CACHE_PREFIX, &vc.cache_identity(), path_and_query);

    if let Some(body) = state.page_cache.get(&key).await {
        return Ok(Html(body).into_response());
    }

    let body = index_page(&state, &vc, params.number()).await?.render()?;
    state.page_cache.insert(key, body.clone()).await;
    Ok(Html(body).into_response())
}

pub async fn group_posts(
    State(state): State<AppState>,
    vc: Vc,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<TemplateResponse> {
    let group = state
        .db
        .get_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No group with slug {}", slug)))?;

    let page_obj = paginate_posts(
        state.db.as_ref(),
        PostScope::Group(group.id),
        params.number(),
        state.posts_per_page(),
    )
    .await?;

    Ok(TemplateResponse::new("posts/group_list.html", &vc)
        .insert("group", &group)
        .insert("page_obj", &page_obj))
}

pub async fn profile(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Query(params): Query<PageParams>,
) -> AppResult<TemplateResponse> {
    let author = get_author(&state, &username).await?;

    let page_obj = paginate_posts(
        state.db.as_ref(),
        PostScope::Author(author.id),
        params.number(),
        state.posts_per_page(),
    )
    .await?;

    let following = match vc.user_id() {
        Some(user_id) if user_id != author.id => state.db.is_following(user_id, author.id).await?,
        _ => false,
    };

    Ok(TemplateResponse::new("posts/profile.html", &vc)
        .insert("author", &author)
        .insert("posts_count", &page_obj.count)
        .insert("page_obj", &page_obj)
        .insert("following", &following))
}

pub async fn post_detail(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<TemplateResponse> {
    let post = get_post(&state, parse_id(&post_id)?).await?;
    let comments = state.db.list_comments(post.id).await?;
    let posts_count = state.db.count_posts(PostScope::Author(post.author.id)).await?;

    Ok(TemplateResponse::new("posts/post_detail.html", &vc)
        .insert("post", &post)
        .insert("comments", &comments)
        .insert("posts_count", &posts_count)
        .insert("form", &CommentForm::default()))
}

fn post_form_page(viewer: &ViewerContext, form: &PostForm, groups: &[Group]) -> TemplateResponse {
    TemplateResponse::new("posts/create_post.html", viewer)
        .insert("form", form)
        .insert("groups", groups)
}

pub async fn post_create_form(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<TemplateResponse> {
    let groups = state.db.list_groups().await?;
    Ok(post_form_page(&current.vc, &PostForm::new(), &groups))
}

pub async fn post_create(
    State(state): State<AppState>,
    current: CurrentUser,
    data: PostFormData,
) -> AppResult<ViewResponse> {
    let groups = state.db.list_groups().await?;
    let mut form = PostForm::bind(data, None);

    let Some(cleaned) = form.validate(&groups) else {
        return Ok(post_form_page(&current.vc, &form, &groups).into());
    };

    let image = match &cleaned.image {
        Some(upload) => Some(state.media.save(POST_IMAGE_DIR, upload).await?),
        None => None,
    };

    let post = state
        .db
        .create_post(
            current.user.id,
            NewPost {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            },
        )
        .await?;
    info!("User {} published post {}", current.user.username, post.id);

    Ok(ViewResponse::see_other(profile_url(&current.user.username)))
}

pub async fn post_edit_form(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<String>,
) -> AppResult<ViewResponse> {
    let post = get_post(&state, parse_id(&post_id)?).await?;
    if post.author.id != current.user.id {
        return Ok(ViewResponse::found(post_detail_url(post.id)));
    }

    let groups = state.db.list_groups().await?;
    Ok(post_form_page(&current.vc, &PostForm::initial(&post), &groups)
        .insert("is_edit", &true)
        .insert("post_id", &post.id)
        .into())
}

pub async fn post_edit(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<String>,
    data: PostFormData,
) -> AppResult<ViewResponse> {
    let post = get_post(&state, parse_id(&post_id)?).await?;
    if post.author.id != current.user.id {
        return Ok(ViewResponse::found(post_detail_url(post.id)));
    }

    let groups = state.db.list_groups().await?;
    let mut form = PostForm::bind(data, Some(&post));

    let Some(cleaned) = form.validate(&groups) else {
        return Ok(post_form_page(&current.vc, &form, &groups)
            .insert("is_edit", &true)
            .insert("post_id", &post.id)
            .into());
    };

    let image = match &cleaned.image {
        Some(upload) => Some(state.media.save(POST_IMAGE_DIR, upload).await?),
        None => post.image.clone(),
    };

    state
        .db
        .update_post(
            post.id,
            NewPost {
                text: cleaned.text,
                group_id: cleaned.group_id,
                image,
            },
        )
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No post with id {}", post.id)))?;
    info!("User {} edited post {}", current.user.username, post.id);

    Ok(ViewResponse::see_other(post_detail_url(post.id)))
}

/// Comments are only ever created; invalid submissions are dropped and the
/// viewer lands back on the post page either way.
pub async fn add_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(post_id): Path<String>,
    Form(mut form): Form<CommentForm>,
) -> AppResult<ViewResponse> {
    let post = get_post(&state, parse_id(&post_id)?).await?;

    if let Some(text) = form.validate() {
        let comment = state
            .db
            .create_comment(post.id, current.user.id, &text)
            .await?;
        info!("User {} commented on post {} ({})", current.user.username, post.id, comment.id);
    }

    Ok(ViewResponse::see_other(post_detail_url(post.id)))
}

pub async fn follow_index(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<PageParams>,
) -> AppResult<TemplateResponse> {
    let page_obj = paginate_posts(
        state.db.as_ref(),
        PostScope::FollowedBy(current.user.id),
        params.number(),
        state.posts_per_page(),
    )
    .await?;

    Ok(TemplateResponse::new("posts/follow.html", &current.vc).insert("page_obj", &page_obj))
}

/// Following yourself or someone already followed is a no-op.
pub async fn profile_follow(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<ViewResponse> {
    let author = get_author(&state, &username).await?;

    if author.id != current.user.id {
        if let Some(follow) = state.db.create_follow(current.user.id, author.id).await? {
            info!("{} now follows {} ({})", current.user.username, author.username, follow.id);
        }
    }

    Ok(ViewResponse::found(profile_url(&author.username)))
}

pub async fn profile_unfollow(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<ViewResponse> {
    let author = get_author(&state, &username).await?;

    let removed = state.db.delete_follow(current.user.id, author.id).await?;
    if removed > 0 {
        info!("{} unfollowed {}", current.user.username, author.username);
    }

    Ok(ViewResponse::found(profile_url(&author.username)))
}
