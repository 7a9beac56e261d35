//! Conversion functions between data models, service inputs, and API DTOs
//!
//! Hand-written on purpose: the post item conversions match
//! exhaustively, so adding a variant fails to compile until every
//! consumer handles it.

use crate::api::dto::*;
use crate::data::{Blog, CommentView, PostItem, PostSummary, PostWithItems, TextStyle, User};
use crate::service::{Page, PageParams, PostInput, PostItemInput, TokenPair};

// =============================================================================
// Requests -> service inputs
// =============================================================================

pub fn text_style_from_dto(style: TextStyleDto) -> TextStyle {
    match style {
        TextStyleDto::Heading => TextStyle::Heading,
        TextStyleDto::Subheading => TextStyle::Subheading,
        TextStyleDto::Paragraph => TextStyle::Paragraph,
    }
}

pub fn text_style_to_dto(style: TextStyle) -> TextStyleDto {
    match style {
        TextStyle::Heading => TextStyleDto::Heading,
        TextStyle::Subheading => TextStyleDto::Subheading,
        TextStyle::Paragraph => TextStyleDto::Paragraph,
    }
}

pub fn post_item_request_to_input(request: PostItemRequest) -> PostItemInput {
    match request {
        PostItemRequest::Text { id, text, style } => PostItemInput::Text {
            id,
            text,
            style: text_style_from_dto(style),
        },
        PostItemRequest::Image {
            id,
            alt,
            description,
            file_name,
        } => PostItemInput::Image {
            id,
            alt,
            description,
            file_name,
        },
    }
}

pub fn post_request_to_input(request: PostRequest) -> PostInput {
    PostInput {
        header: request.header,
        subheader: request.subheader,
        items: request
            .items
            .into_iter()
            .map(post_item_request_to_input)
            .collect(),
    }
}

pub fn page_query_to_params(query: PageQuery) -> PageParams {
    PageParams {
        page: query.page,
        per_page: query.per_page,
    }
}

// =============================================================================
// Models -> responses
// =============================================================================

/// Public user fields; the credential hash never leaves the server.
pub fn user_to_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.clone(),
        email: user.email.clone(),
        name: user.name.clone(),
        avatar_file_name: user.avatar_file_name.clone(),
        created_at: user.created_at,
    }
}

pub fn blog_to_response(blog: &Blog) -> BlogResponse {
    BlogResponse {
        id: blog.id.clone(),
        user_id: blog.user_id.clone(),
        name: blog.name.clone(),
        tag: blog.tag.clone(),
        description: blog.description.clone(),
        avatar_file_name: blog.avatar_file_name.clone(),
        created_at: blog.created_at,
    }
}

pub fn post_item_to_response(item: &PostItem) -> PostItemResponse {
    match item {
        PostItem::Text { id, text, style } => PostItemResponse::Text {
            id: id.clone(),
            text: text.clone(),
            style: text_style_to_dto(*style),
        },
        PostItem::Image {
            id,
            alt,
            description,
            file_name,
        } => PostItemResponse::Image {
            id: id.clone(),
            alt: alt.clone(),
            description: description.clone(),
            file_name: file_name.clone(),
        },
    }
}

pub fn post_to_response(loaded: &PostWithItems) -> PostResponse {
    PostResponse {
        id: loaded.post.id.clone(),
        blog_id: loaded.post.blog_id.clone(),
        header: loaded.post.header.clone(),
        subheader: loaded.post.subheader.clone(),
        is_modified: loaded.post.is_modified,
        created_at: loaded.post.created_at,
        items: loaded.items.iter().map(post_item_to_response).collect(),
    }
}

pub fn post_summary_to_response(summary: &PostSummary) -> PostTitleResponse {
    PostTitleResponse {
        id: summary.id.clone(),
        header: summary.header.clone(),
        subheader: summary.subheader.clone(),
        is_modified: summary.is_modified,
        created_at: summary.created_at,
        blog_tag: summary.blog_tag.clone(),
    }
}

pub fn comment_view_to_response(view: &CommentView) -> CommentResponse {
    CommentResponse {
        id: view.id.clone(),
        post_id: view.post_id.clone(),
        user_id: view.user_id.clone(),
        text: view.text.clone(),
        is_modified: view.is_modified,
        created_at: view.created_at,
        user_name: view.user_name.clone(),
        user_blog_tag: view.user_blog_tag.clone(),
    }
}

pub fn tokens_to_response(pair: &TokenPair) -> TokensResponse {
    TokensResponse {
        access_token: pair.access_token.clone(),
        refresh_token: pair.refresh_token.clone(),
    }
}

pub fn page_to_response<T, R>(page: Page<T>, convert: impl Fn(&T) -> R) -> PagedResponse<R> {
    PagedResponse {
        data: page.data.iter().map(convert).collect(),
        page: page.params.page,
        per_page: page.params.per_page,
    }
}
