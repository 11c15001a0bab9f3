use terminal_quest::{
    CommandProcessor, CommandResult, FsError, Game, GameConfig, GameEvent, MemoryStore, Verdict,
    Vfs,
};

fn sh() -> (Vfs, CommandProcessor) {
    (Vfs::new(), CommandProcessor::new())
}

/// Submit every objective of the current mission in order.
fn play_current(game: &mut Game, clock: f64) {
    let index = game.state().current_mission;
    let commands: Vec<String> = game.missions()[index]
        .objectives
        .iter()
        .map(|o| o.command.clone())
        .collect();
    for command in &commands {
        let turn = game.submit(command, clock);
        assert_eq!(turn.verdict, Verdict::Matched, "mission {}: {}", index + 1, command);
    }
}

fn output(fs: &mut Vfs, p: &mut CommandProcessor, line: &str) -> String {
    match p.execute(fs, line).result {
        CommandResult::Output(text) => text,
        other => panic!("`{}` gave {:?}", line, other),
    }
}

#[test]
fn test_cd_equivalent_paths_give_same_pwd() {
    let (mut fs, mut p) = sh();
    let forms = [
        "projects/website",
        "./projects/website",
        "~/projects/website",
        "/home/user/projects/website",
        "documents/../projects/./website",
    ];
    for form in forms {
        output(&mut fs, &mut p, "cd ~");
        output(&mut fs, &mut p, &format!("cd {}", form));
        assert_eq!(output(&mut fs, &mut p, "pwd"), "/home/user/projects/website", "{}", form);
    }
}

#[test]
fn test_touch_idempotent_mkdir_not() {
    let mut fs = Vfs::new();
    fs.touch("notes.md").unwrap();
    fs.write("notes.md", "keep").unwrap();
    fs.touch("notes.md").unwrap();
    assert_eq!(fs.read("notes.md").unwrap(), "keep");
    fs.mkdir("d").unwrap();
    assert_eq!(fs.mkdir("d"), Err(FsError::AlreadyExists));
}

#[test]
fn test_mv_equals_cp_then_rm() {
    let (mut a, mut pa) = sh();
    let (mut b, mut pb) = sh();
    output(&mut a, &mut pa, "mv old.txt documents/renamed.txt");
    output(&mut b, &mut pb, "cp old.txt documents/renamed.txt");
    output(&mut b, &mut pb, "rm old.txt");
    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_grep_invert_partitions_lines() {
    let (mut fs, mut p) = sh();
    for file in ["users.txt", "logs/server.log", "config.txt"] {
        for pattern in ["developer", "ERROR", "o"] {
            let hit = output(&mut fs, &mut p, &format!("grep {} {}", pattern, file));
            let miss = output(&mut fs, &mut p, &format!("grep -v {} {}", pattern, file));
            let hits = hit.lines().filter(|l| !l.is_empty()).count();
            let misses = miss.lines().filter(|l| !l.is_empty()).count();
            let total = fs.read(file).unwrap().lines().count();
            assert_eq!(hits + misses, total);
            let counted = output(&mut fs, &mut p, &format!("grep -c {} {}", pattern, file));
            assert_eq!(counted, hits.to_string());
        }
    }
}

#[test]
fn test_cat_message() {
    let (mut fs, mut p) = sh();
    assert_eq!(
        output(&mut fs, &mut p, "cat message.txt"),
        "Welcome to TechCorp! Good luck on your first day."
    );
}

#[test]
fn test_grep_pipe_wc() {
    let (mut fs, mut p) = sh();
    assert_eq!(output(&mut fs, &mut p, "grep ERROR logs/server.log | wc -l"), "2");
}

#[test]
fn test_find_txt_preorder() {
    let (mut fs, mut p) = sh();
    let found = output(&mut fs, &mut p, "find . -name \"*.txt\"");
    let expected = [
        "./documents/report.txt",
        "./documents/notes.txt",
        "./message.txt",
        "./test.txt",
        "./old.txt",
        "./junk.txt",
        "./users.txt",
        "./config.txt",
        "./data.txt",
    ];
    assert_eq!(found.lines().collect::<Vec<_>>(), expected);
}

#[test]
fn test_ls_glob_lists_home_txt_only() {
    let (mut fs, mut p) = sh();
    let names = output(&mut fs, &mut p, "ls *.txt");
    let names: Vec<&str> = names.split("  ").collect();
    assert_eq!(names.len(), 7);
    assert!(names.iter().all(|n| n.ends_with(".txt") && !n.contains('/')));
}

#[test]
fn test_rejected_commands_leave_filesystem_alone() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    let before = game.fs().snapshot();
    for line in ["rm junk.txt", "touch x.txt", "mkdir d", "ls > list.txt", "cp test.txt t2.txt"] {
        let turn = game.submit(line, 0.0);
        assert_eq!(turn.verdict, Verdict::Rejected, "{}", line);
    }
    assert_eq!(game.fs().snapshot(), before);
    assert_eq!(game.objectives_done(), &[false, false]);
}

#[test]
fn test_restart_restores_pre_mission_tree() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    game.load_mission(2, 0.0).unwrap();
    let before = game.fs().snapshot();
    game.submit("touch README.md", 0.0);
    game.submit("mkdir src", 0.0);
    game.restart_mission(0.0).unwrap();
    assert_eq!(game.fs().snapshot(), before);
    assert_eq!(game.active_objective(), Some(0));
}

#[test]
fn test_restart_keeps_earlier_missions_work() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    for _ in 0..4 {
        play_current(&mut game, 0.0);
        assert!(game.advance(0.0).unwrap());
    }
    assert_eq!(game.state().current_mission, 4);
    game.submit("cp test.txt backup.txt", 0.0);
    game.submit("mv old.txt new.txt", 0.0);
    game.restart_mission(0.0).unwrap();
    assert!(game.fs().exists("README.md"));
    assert!(game.fs().is_dir("src"));
    assert!(game.fs().exists("old.txt"));
    assert!(!game.fs().exists("new.txt"));
    assert!(!game.fs().exists("backup.txt"));
}

#[test]
fn test_reload_between_missions_keeps_work() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    let mut store = MemoryStore::default();
    for _ in 0..2 {
        play_current(&mut game, 0.0);
        game.advance(0.0).unwrap();
    }
    play_current(&mut game, 0.0);
    assert_eq!(game.pending_advance(), Some(3));
    game.save(&mut store).unwrap();

    let mut fresh = Game::new(GameConfig::default(), 0.0);
    assert!(fresh.load(&store, 0.0).unwrap());
    assert_eq!(fresh.state().current_mission, 3);
    assert_eq!(fresh.active_objective(), Some(0));
    assert!(fresh.fs().exists("README.md"));
    assert!(fresh.fs().is_dir("src"));
    assert!(!fresh.advance(0.0).unwrap());

    // The resumed mission's restart point also carries the earlier work.
    fresh.restart_mission(0.0).unwrap();
    assert!(fresh.fs().exists("README.md"));
}

#[test]
fn test_reload_after_final_mission_keeps_tree() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    let mut store = MemoryStore::default();
    for _ in 0..game.missions().len() {
        play_current(&mut game, 0.0);
        game.advance(0.0).unwrap();
    }
    assert_eq!(game.active_objective(), None);
    game.save(&mut store).unwrap();

    for _ in 0..2 {
        let mut fresh = Game::new(GameConfig::default(), 0.0);
        assert!(fresh.load(&store, 0.0).unwrap());
        assert_eq!(fresh.state().current_mission, 14);
        assert_eq!(fresh.active_objective(), None);
        assert_eq!(fresh.fs().snapshot(), game.fs().snapshot());
        assert_eq!(fresh.fs().read("audit/total_entries.txt").unwrap(), "12");
        fresh.save(&mut store).unwrap();
    }
}

#[test]
fn test_full_playthrough() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    let mut store = MemoryStore::default();
    let mut clock = 0.0;
    let mut finished = false;
    for index in 0..game.missions().len() {
        assert_eq!(game.state().current_mission, index);
        let commands: Vec<String> = game.missions()[index]
            .objectives
            .iter()
            .map(|o| o.command.clone())
            .collect();
        for command in &commands {
            clock += 90_000.0;
            let turn = game.submit(command, clock);
            assert_eq!(turn.verdict, Verdict::Matched, "mission {}: {}", index + 1, command);
            assert!(
                !turn.result.is_error(),
                "mission {}: {} -> {:?}",
                index + 1,
                command,
                turn.result
            );
            finished |= turn.events.contains(&GameEvent::AllMissionsComplete);
        }
        game.save(&mut store).unwrap();
        game.advance(clock).unwrap();
    }
    assert!(finished);
    let player = &game.state().player;
    assert_eq!(player.missions_completed, 15);
    assert!(player.level > 5);
    assert_eq!(game.fs().read("report.txt").unwrap(), "4");
    assert_eq!(game.fs().read("audit/total_entries.txt").unwrap(), "12");
    assert_eq!(
        game.fs().list("audit").unwrap(),
        vec!["all_txt_files.txt", "server.log", "access.log", "error.log", "total_entries.txt"]
    );
}

#[test]
fn test_turn_json_shape() {
    let mut game = Game::new(GameConfig::default(), 0.0);
    let turn = game.submit("ls", 0.0);
    let json = serde_json::to_value(&turn).unwrap();
    assert_eq!(json["verdict"], "matched");
    assert_eq!(json["result"]["kind"], "output");
    assert_eq!(json["prompt"], "user@terminal-quest:~$ ");
    assert!(json["events"]
        .as_array()
        .unwrap()
        .iter()
        .any(|e| e["event"] == "achievement_unlocked" && e["id"] == "first_command"));
}
