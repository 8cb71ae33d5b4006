use ogte::db::Database;
use ogte::host::{AccessControl, CourseModuleViewed, EventSink, RecordStore};
use ogte::models::*;
use speculate2::speculate;

struct Fixture {
    course: Course,
    activity: Activity,
    cm: CourseModule,
}

fn create_fixture(db: &Database) -> Fixture {
    let course = db
        .create_course(CreateCourseInput {
            fullname: "English Communication".to_string(),
            shortname: "ENG1".to_string(),
        })
        .expect("Failed to create course");
    let section = db
        .create_course_section(course.id, 1, None)
        .expect("Failed to create section");
    let activity = db
        .create_activity(CreateActivityInput {
            course: course.id,
            name: "Graded reading".to_string(),
            intro: None,
            mode: ActivityMode::Standard,
            preventry: None,
        })
        .expect("Failed to create activity");
    let cm = db
        .create_course_module(CreateCourseModuleInput {
            course: course.id,
            instance: activity.id,
            section: section.id,
        })
        .expect("Failed to create course module");

    Fixture {
        course,
        activity,
        cm,
    }
}

fn list_data(fixture: &Fixture, name: &str) -> ListFormData {
    ListFormData {
        id: 0,
        courseid: fixture.course.id,
        moduleid: fixture.cm.id,
        name: name.to_string(),
        description: format!("{} description", name),
        status: ListStatus::Empty,
        props: String::new(),
    }
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
        let fixture = create_fixture(&db);
    }

    describe "course structure" {
        it "resolves a course module to its course and activity" {
            let cm = db.get_course_module(fixture.cm.id).expect("Query failed").expect("cm missing");
            assert_eq!(cm, fixture.cm);

            let course = db.get_course(cm.course).expect("Query failed").expect("course missing");
            assert_eq!(course.fullname, "English Communication");

            let activity = db.get_activity(cm.instance).expect("Query failed").expect("activity missing");
            assert_eq!(activity, fixture.activity);
        }

        it "returns None for unknown ids" {
            assert!(db.get_course_module(9999).expect("Query failed").is_none());
            assert!(db.get_course(9999).expect("Query failed").is_none());
            assert!(db.get_course_section(9999).expect("Query failed").is_none());
            assert!(db.get_activity(9999).expect("Query failed").is_none());
        }

        it "stores the download mode flag" {
            let activity = db.create_activity(CreateActivityInput {
                course: fixture.course.id,
                name: "Handouts".to_string(),
                intro: Some("Get the pack".to_string()),
                mode: ActivityMode::Download,
                preventry: Some(fixture.activity.id),
            }).expect("Failed to create");

            let found = db.get_activity(activity.id).expect("Query failed").unwrap();
            assert_eq!(found.mode, ActivityMode::Download);
            assert_eq!(found.preventry, Some(fixture.activity.id));
        }
    }

    describe "lists" {
        it "creates a list from form data" {
            let list = db.create_list(list_data(&fixture, "NGSL")).expect("Failed to create");

            assert!(list.id > 0);
            let found = db.get_list(list.id).expect("Query failed").unwrap();
            assert_eq!(found, list);
            assert_eq!(found.status, ListStatus::Empty);
        }

        it "updates a list in place" {
            let list = db.create_list(list_data(&fixture, "NGSL")).expect("Failed to create");

            let mut data = list_data(&fixture, "NGSL 1.2");
            data.status = ListStatus::Ready;
            data.props = "{\"source\":\"ngsl\"}".to_string();
            let updated = db.update_list(list.id, data).expect("Update failed").unwrap();

            assert_eq!(updated.id, list.id);
            let found = db.get_list(list.id).expect("Query failed").unwrap();
            assert_eq!(found.name, "NGSL 1.2");
            assert_eq!(found.status, ListStatus::Ready);
            assert_eq!(found.props, "{\"source\":\"ngsl\"}");
        }

        it "does not update a missing list" {
            let result = db.update_list(404, list_data(&fixture, "Ghost")).expect("Update failed");
            assert!(result.is_none());
        }

        it "lists a module's lists by name" {
            db.create_list(list_data(&fixture, "Zulu")).expect("Failed to create");
            db.create_list(list_data(&fixture, "Alpha")).expect("Failed to create");

            let lists = db.get_lists_by_module(fixture.cm.id).expect("Query failed");
            let names: Vec<&str> = lists.iter().map(|l| l.name.as_str()).collect();
            assert_eq!(names, vec!["Alpha", "Zulu"]);
            assert!(db.get_lists_by_module(fixture.cm.id + 1).expect("Query failed").is_empty());
        }
    }

    describe "levels" {
        it "carries the owning list's name" {
            let list = db.create_list(list_data(&fixture, "AWL")).expect("Failed to create");
            let level = db.create_level(list.id, CreateLevelInput { label: "Sublist 1".to_string() })
                .expect("Failed to create level");

            assert_eq!(level.listname, "AWL");
            assert_eq!(level.display_label(), "AWL - Sublist 1");

            let levels = db.get_levels_for_list(list.id).expect("Query failed");
            assert_eq!(levels, vec![level]);
        }

        it "refuses levels for a missing list" {
            let result = db.create_level(777, CreateLevelInput { label: "Nope".to_string() });
            assert!(result.is_err());
        }
    }

    describe "entries" {
        it "returns only the user's entries for the activity" {
            for userid in [2, 2, 3] {
                db.create_entry(CreateEntryInput {
                    ogte: fixture.activity.id,
                    userid,
                    listid: 1,
                    levelid: 1,
                    text: String::new(),
                }).expect("Failed to create entry");
            }
            db.create_entry(CreateEntryInput {
                ogte: fixture.activity.id + 1,
                userid: 2,
                listid: 1,
                levelid: 1,
                text: String::new(),
            }).expect("Failed to create entry");

            let entries = db.get_user_entries(2, fixture.activity.id).expect("Query failed");
            assert_eq!(entries.len(), 2);
            assert!(entries.iter().all(|e| e.userid == 2 && e.ogte == fixture.activity.id));
        }

        it "returns entries in id order" {
            let ids: Vec<i64> = (0..3).map(|i| {
                db.create_entry(CreateEntryInput {
                    ogte: fixture.activity.id,
                    userid: 5,
                    listid: 1,
                    levelid: i,
                    text: format!("entry {}", i),
                }).expect("Failed to create entry").id
            }).collect();

            let found: Vec<i64> = db.get_user_entries(5, fixture.activity.id)
                .expect("Query failed")
                .iter()
                .map(|e| e.id)
                .collect();
            assert_eq!(found, ids);
        }
    }

    describe "sessions and capabilities" {
        it "resolves a session by token" {
            let session = db.create_session(42).expect("Failed to create session");
            assert_eq!(session.sesskey.len(), 10);

            let found = db.get_session(&session.token).expect("Query failed").unwrap();
            assert_eq!(found.userid, 42);
            assert_eq!(found.sesskey, session.sesskey);
            assert!(db.get_session("not-a-token").expect("Query failed").is_none());
        }

        it "grants capabilities per module" {
            db.grant_capability(7, fixture.cm.id, Capability::AddEntries).expect("Grant failed");
            db.grant_capability(7, fixture.cm.id, Capability::AddEntries).expect("Grant is idempotent");

            assert!(db.has_capability(7, Capability::AddEntries, fixture.cm.id).unwrap());
            assert!(!db.has_capability(7, Capability::Manage, fixture.cm.id).unwrap());
            assert!(!db.has_capability(7, Capability::AddEntries, fixture.cm.id + 1).unwrap());
            assert!(!db.has_capability(8, Capability::AddEntries, fixture.cm.id).unwrap());
        }
    }

    describe "tracking" {
        it "marks a module viewed once" {
            assert!(!db.is_module_viewed(fixture.cm.id, 3).unwrap());
            db.set_module_viewed(fixture.cm.id, 3).expect("Failed to mark viewed");
            db.set_module_viewed(fixture.cm.id, 3).expect("Second mark is harmless");
            assert!(db.is_module_viewed(fixture.cm.id, 3).unwrap());
        }

        it "logs viewed events with their snapshots" {
            let mut event = CourseModuleViewed::new(fixture.activity.id, fixture.cm.id, 3);
            event.add_record_snapshot("course", &fixture.course).unwrap();
            db.trigger(&event).expect("Failed to log event");

            let events = db.get_events_for_module(fixture.cm.id).expect("Query failed");
            assert_eq!(events, vec![event]);
            assert_eq!(events[0].snapshot("course").unwrap()["shortname"], "ENG1");
        }
    }

    describe "file storage" {
        it "keeps data across reopen" {
            let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = temp_dir.path().join("nested").join("ogte.db");

            let first = Database::open(path.clone()).expect("Failed to open database");
            first.migrate().expect("Failed to run migrations");
            let course = first.create_course(CreateCourseInput {
                fullname: "Reading Lab".to_string(),
                shortname: "RL".to_string(),
            }).expect("Failed to create course");
            drop(first);

            let second = Database::open(path).expect("Failed to reopen database");
            second.migrate().expect("Migrations are idempotent");
            let found = second.get_course(course.id).expect("Query failed").unwrap();
            assert_eq!(found.shortname, "RL");
        }
    }
}
