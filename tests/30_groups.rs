mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::Session;

#[tokio::test]
async fn invite_flow_is_single_use() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let owner = Session::register(server, "inv-owner").await?;
    let joiner = Session::register(server, "inv-joiner").await?;
    let late = Session::register(server, "inv-late").await?;

    let (status, body) = owner.post(&format!("/api/groups/{}/invite", owner.group_id), json!({})).await?;
    assert_eq!(status, StatusCode::OK);
    let code = body["invite_code"].as_str().unwrap_or_default().to_string();
    assert_eq!(code.len(), 32);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit()));

    // Members cannot generate invites for a group they do not own
    let (status, _) = joiner.post(&format!("/api/groups/{}/invite", owner.group_id), json!({})).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = joiner.post("/api/groups/invite/accept", json!({ "invite_code": code })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["group"]["id"], owner.group_id);

    let (status, _) = late.post("/api/groups/invite/accept", json!({ "invite_code": code })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = late.post("/api/groups/invite/accept", json!({})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = owner.get(&format!("/api/groups/{}", owner.group_id)).await?;
    assert_eq!(status, StatusCode::OK);
    let members = body["members"].as_array().cloned().unwrap_or_default();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], "owner");

    Ok(())
}

#[tokio::test]
async fn owner_manages_members() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let owner = Session::register(server, "mem-owner").await?;
    let member = Session::register(server, "mem-member").await?;
    let group = owner.group_id;

    let (status, body) = owner
        .post(&format!("/api/groups/{}/members", group), json!({ "email": member.email }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["member"]["role"], "member");

    let (status, _) = owner
        .post(&format!("/api/groups/{}/members", group), json!({ "email": member.email }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = owner
        .post(
            &format!("/api/groups/{}/members", group),
            json!({ "email": common::unique_email("nobody") }),
        )
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = owner
        .post(
            &format!("/api/groups/{}/members", group),
            json!({ "email": member.email, "role": "admin" }),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Last owner cannot be demoted
    let (status, _) = owner
        .patch(&format!("/api/groups/{}/members/{}", group, owner.user_id), json!({ "role": "member" }))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = owner
        .patch(&format!("/api/groups/{}/members/{}", group, member.user_id), json!({ "role": "owner" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "owner");

    let (status, _) = owner
        .delete(&format!("/api/groups/{}/members/{}", group, owner.user_id))
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = owner
        .delete(&format!("/api/groups/{}/members/{}", group, member.user_id))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = owner
        .delete(&format!("/api/groups/{}/members/{}", group, member.user_id))
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn removed_member_loses_group_access() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let owner = Session::register(server, "rm-owner").await?;
    let mut member = Session::register(server, "rm-member").await?;

    let (status, _) = owner
        .post(&format!("/api/groups/{}/members", owner.group_id), json!({ "email": member.email }))
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    member.switch_group(owner.group_id).await?;
    let (status, _) = member.get("/api/items").await?;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = owner
        .delete(&format!("/api/groups/{}/members/{}", owner.group_id, member.user_id))
        .await?;
    assert_eq!(status, StatusCode::OK);

    // The token still names the group, but membership is re-checked
    let (status, _) = member.get("/api/items").await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn group_lifecycle_and_isolation() -> Result<()> {
    let Some(server) = common::ensure_server().await? else { return Ok(()) };
    let owner = Session::register(server, "grp-owner").await?;
    let stranger = Session::register(server, "grp-stranger").await?;

    let (status, _) = owner.post("/api/groups", json!({ "name": "  " })).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = owner.post("/api/groups", json!({ "name": "Nursery" })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let group = body["group"]["id"].as_i64().unwrap_or_default();

    let (status, body) = owner.get("/api/groups").await?;
    assert_eq!(status, StatusCode::OK);
    let groups = body["groups"].as_array().cloned().unwrap_or_default();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["id"], group);
    assert_eq!(groups[0]["memberCount"], 1);

    let (status, _) = stranger.get(&format!("/api/groups/{}", group)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = stranger.delete(&format!("/api/groups/{}", group)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Children of another group stay invisible
    let (status, _) = stranger.get(&format!("/api/children?groupId={}", owner.group_id)).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = owner.delete(&format!("/api/groups/{}", group)).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = owner.get(&format!("/api/groups/{}", group)).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
