//! The activity view page.
//!
//! Shows the current user's entries for one ogte activity, or the download
//! page when the activity is in download mode. All services come in through
//! [`Services`], and the user through [`RequestContext`], for one request.

mod render;
mod rows;

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

pub use render::*;
pub use rows::*;

use crate::config::SiteConfig;
use crate::host::{AccessControl, CourseModuleViewed, EventSink, RecordStore};
use crate::models::*;
use crate::strings::get_string;
use crate::url::PageUrl;

/// The logged-in user a request is made for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub userid: i64,
    pub sesskey: String,
}

impl From<Session> for RequestContext {
    fn from(session: Session) -> Self {
        Self {
            userid: session.userid,
            sesskey: session.sesskey,
        }
    }
}

/// The host services a page uses.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub records: &'a dyn RecordStore,
    pub access: &'a dyn AccessControl,
    pub events: &'a dyn EventSink,
}

impl<'a> Services<'a> {
    /// Use one backend for every service.
    pub fn from_backend<B>(backend: &'a B) -> Self
    where
        B: RecordStore + AccessControl + EventSink,
    {
        Self {
            records: backend,
            access: backend,
            events: backend,
        }
    }
}

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("Course Module ID was incorrect")]
    CourseModuleNotFound(i64),

    #[error("Course is misconfigured")]
    CourseMisconfigured(i64),

    #[error("Invalid course module ID")]
    InvalidCourseModule(i64),

    #[error("Access denied")]
    AccessDenied,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct PageHeader {
    pub url: PageUrl,
    pub title: String,
    pub heading: String,
    pub navbar: Vec<String>,
}

/// A rendered view page.
#[derive(Debug, Clone, Serialize)]
pub struct ViewPage<T> {
    pub header: PageHeader,
    pub content: T,
    /// Shown below the content to users who manage the activity.
    pub lists_button: Option<SingleButton>,
}

/// Build the view page of course module `cmid` for the requesting user.
pub fn view_activity<R: Renderer>(
    request: &RequestContext,
    site: &SiteConfig,
    services: Services<'_>,
    renderer: &R,
    cmid: i64,
) -> Result<ViewPage<R::Output>, ViewError> {
    let records = services.records;

    let cm = records
        .get_course_module(cmid)?
        .ok_or(ViewError::CourseModuleNotFound(cmid))?;
    let course = records
        .get_course(cm.course)?
        .ok_or(ViewError::CourseMisconfigured(cm.course))?;

    services.events.set_module_viewed(cm.id, request.userid)?;

    let entries_manager = services
        .access
        .has_capability(request.userid, Capability::ManageEntries, cm.id)?;
    let can_add = services
        .access
        .has_capability(request.userid, Capability::AddEntries, cm.id)?;

    if !entries_manager && !can_add {
        tracing::warn!(userid = request.userid, cmid, "View denied: no entry capability");
        return Err(ViewError::AccessDenied);
    }

    let activity = records
        .get_activity(cm.instance)?
        .ok_or(ViewError::InvalidCourseModule(cmid))?;
    records
        .get_course_section(cm.section)?
        .ok_or(ViewError::InvalidCourseModule(cmid))?;

    if let Some(previd) = activity.preventry {
        if records.get_activity(previd)?.is_none() {
            tracing::debug!(cmid, previd, "Previous activity no longer exists");
        }
    }

    let header = PageHeader {
        url: PageUrl::module_page("", "view.php").param("id", cm.id),
        title: activity.name.clone(),
        heading: course.fullname.clone(),
        navbar: vec![activity.name.clone()],
    };

    let intro = activity
        .intro
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    if activity.mode == ActivityMode::Download {
        tracing::debug!(cmid, "Showing download page");
        let data = DownloadPageData {
            intro,
            downloadbutton: SingleButton::get(
                PageUrl::module_page(&site.wwwroot, "download.php").param("id", cm.id),
                get_string("download"),
            ),
        };
        return Ok(ViewPage {
            header,
            content: render(renderer, DOWNLOAD_TEMPLATE, &data)?,
            lists_button: None,
        });
    }

    let mut data = ViewPageData {
        intro,
        ..Default::default()
    };

    let entries = records.get_user_entries(request.userid, activity.id)?;
    if !entries.is_empty() {
        let list_ids: BTreeSet<i64> = entries.iter().map(|e| e.listid).collect();
        let mut levels = Vec::new();
        for listid in list_ids {
            levels.extend(records.get_levels_for_list(listid)?);
        }
        let links = EntryLinks {
            wwwroot: &site.wwwroot,
            cmid: cm.id,
            sesskey: &request.sesskey,
        };

        data.entries = build_entry_rows(entries, &level_lookup(levels), &links);
        data.haveentries = true;
    }

    if can_add {
        data.addnewbutton = Some(SingleButton::get(
            PageUrl::module_page(&site.wwwroot, "edit.php").param("id", cm.id),
            get_string("addnew"),
        ));
    }

    let content = render(renderer, VIEW_TEMPLATE, &data)?;

    let lists_button = if services
        .access
        .has_capability(request.userid, Capability::Manage, cm.id)?
    {
        Some(SingleButton::get(
            PageUrl::module_page(&site.wwwroot, "lists.php").param("id", cm.id),
            get_string("addeditlists"),
        ))
    } else {
        None
    };

    let mut event = CourseModuleViewed::new(activity.id, cm.id, request.userid);
    event.add_record_snapshot("course_modules", &cm)?;
    event.add_record_snapshot("course", &course)?;
    event.add_record_snapshot("ogte", &activity)?;
    services.events.trigger(&event)?;

    tracing::debug!(cmid, entries = data.entries.len(), "Rendered view page");

    Ok(ViewPage {
        header,
        content,
        lists_button,
    })
}

fn render<R: Renderer, T: Serialize>(
    renderer: &R,
    template: &str,
    data: &T,
) -> Result<R::Output, ViewError> {
    let data = serde_json::to_value(data).map_err(anyhow::Error::from)?;
    Ok(renderer.render_from_template(template, &data)?)
}
