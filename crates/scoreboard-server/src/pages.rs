//! Inline HTML pages.
//!
//! Both pages are static; all live data arrives over `/ws` as `update`
//! events and is rendered client-side.

/// Public viewer page served at `GET /`.
pub const VIEWER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Safety Scoreboard</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
            margin: 0;
            padding: 2rem;
            text-align: center;
        }
        h1 { color: #58a6ff; margin-bottom: 0.25rem; }
        .subtitle { color: #8b949e; margin-top: 0; }
        .days { font-size: 9rem; font-weight: bold; color: #3fb950; line-height: 1; }
        .days-label { font-size: 1.5rem; color: #8b949e; }
        .clock { font-size: 2.5rem; font-family: 'Consolas', monospace; margin: 1rem 0; }
        .metric {
            display: inline-block;
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem;
            min-width: 140px;
        }
        .metric .label { color: #8b949e; font-size: 0.85rem; }
        .metric .value { color: #58a6ff; font-size: 1.5rem; font-weight: bold; }
        .paused { color: #d29922; }
        .offline { color: #f85149; }
        ul { list-style: none; padding: 0; max-width: 640px; margin: 1rem auto; text-align: left; }
        li { padding: 0.4rem 0; border-bottom: 1px solid #30363d; }
        li .date { color: #8b949e; margin-right: 1rem; }
    </style>
</head>
<body>
    <h1>Safety Scoreboard</h1>
    <p class="subtitle">Time since the last recorded incident</p>

    <div class="days" id="days">0</div>
    <div class="days-label">days without incident</div>
    <div class="clock" id="clock">00:00:00</div>
    <div id="status" class="paused">Paused</div>

    <div>
        <div class="metric">
            <div class="label">Best streak (days)</div>
            <div class="value" id="best">0</div>
        </div>
        <div class="metric">
            <div class="label">Incidents</div>
            <div class="value" id="count">0</div>
        </div>
        <div class="metric">
            <div class="label">Tracking since</div>
            <div class="value" id="since">-</div>
        </div>
    </div>

    <h2>Incident log</h2>
    <ul id="incidents"></ul>

    <script>
        const pad = (n) => String(n).padStart(2, '0');

        function render(view) {
            document.getElementById('days').textContent = view.days;
            document.getElementById('clock').textContent =
                pad(view.hours) + ':' + pad(view.minutes) + ':' + pad(view.seconds);
            const status = document.getElementById('status');
            status.textContent = view.running ? 'Running' : 'Paused';
            status.className = view.running ? '' : 'paused';
            document.getElementById('best').textContent = view.bestDays;
            document.getElementById('count').textContent = view.incidentsCount;
            document.getElementById('since').textContent =
                new Date(view.startDate).toLocaleDateString();

            const list = document.getElementById('incidents');
            list.replaceChildren();
            for (const incident of [...view.incidents].reverse()) {
                const item = document.createElement('li');
                const date = document.createElement('span');
                date.className = 'date';
                date.textContent = new Date(incident.date).toLocaleString();
                item.appendChild(date);
                item.appendChild(document.createTextNode(incident.note));
                list.appendChild(item);
            }
        }

        function connect() {
            const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
            const socket = new WebSocket(scheme + '://' + location.host + '/ws');
            socket.onmessage = (message) => {
                const frame = JSON.parse(message.data);
                if (frame.event === 'update') {
                    render(frame.data);
                }
            };
            socket.onclose = () => {
                const status = document.getElementById('status');
                status.textContent = 'Reconnecting...';
                status.className = 'offline';
                setTimeout(connect, 2000);
            };
        }

        connect();
    </script>
</body>
</html>
"#;

/// Admin page served at `GET /admin`.
pub const ADMIN: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Safety Scoreboard Admin</title>
    <style>
        body {
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Segoe UI', 'Helvetica Neue', Arial, sans-serif;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }
        h1 { color: #58a6ff; }
        button {
            background: #21262d;
            color: #c9d1d9;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.5rem 1rem;
            margin: 0.25rem;
            cursor: pointer;
        }
        button:hover { border-color: #58a6ff; }
        button.danger { border-color: #f85149; color: #f85149; }
        input {
            background: #0d1117;
            color: #c9d1d9;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.5rem;
            width: 60%;
        }
        .clock { font-size: 2rem; font-family: 'Consolas', monospace; }
        .message { color: #f85149; min-height: 1.5rem; }
        .hidden { display: none; }
        ul { list-style: none; padding: 0; }
        li { padding: 0.4rem 0; border-bottom: 1px solid #30363d; }
        li .date { color: #8b949e; margin-right: 1rem; }
    </style>
</head>
<body>
    <h1>Safety Scoreboard Admin</h1>

    <section id="login">
        <form id="login-form">
            <input type="password" id="password" placeholder="Admin password" autocomplete="current-password">
            <button type="submit">Log in</button>
        </form>
    </section>

    <section id="panel" class="hidden">
        <div class="clock" id="clock">0d 00:00:00</div>
        <p>Status: <span id="status">Paused</span> | Best streak: <span id="best">0</span> days</p>

        <div>
            <button data-event="start">Start</button>
            <button data-event="stop">Stop</button>
            <button data-event="reset" class="danger">Reset</button>
            <button id="logout">Log out</button>
        </div>

        <h2>Record incident</h2>
        <form id="incident-form">
            <input type="text" id="note" placeholder="What happened?">
            <button type="submit" class="danger">Add incident</button>
        </form>

        <h2>Incident log</h2>
        <ul id="incidents"></ul>
    </section>

    <p class="message" id="message"></p>

    <script>
        const pad = (n) => String(n).padStart(2, '0');
        let socket = null;

        function showMessage(text) {
            document.getElementById('message').textContent = text || '';
        }

        function send(event, data) {
            if (socket && socket.readyState === WebSocket.OPEN) {
                socket.send(JSON.stringify({ event, data }));
            }
        }

        function render(view) {
            document.getElementById('clock').textContent =
                view.days + 'd ' + pad(view.hours) + ':' + pad(view.minutes) + ':' + pad(view.seconds);
            document.getElementById('status').textContent = view.running ? 'Running' : 'Paused';
            document.getElementById('best').textContent = view.bestDays;

            const list = document.getElementById('incidents');
            list.replaceChildren();
            for (const incident of [...view.incidents].reverse()) {
                const item = document.createElement('li');
                const date = document.createElement('span');
                date.className = 'date';
                date.textContent = new Date(incident.date).toLocaleString();
                const remove = document.createElement('button');
                remove.textContent = 'Delete';
                remove.className = 'danger';
                remove.onclick = () => send('deleteIncident', incident.id);
                item.appendChild(date);
                item.appendChild(document.createTextNode(incident.note));
                item.appendChild(remove);
                list.appendChild(item);
            }
        }

        function connect() {
            const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
            socket = new WebSocket(scheme + '://' + location.host + '/ws');
            socket.onmessage = (message) => {
                const frame = JSON.parse(message.data);
                if (frame.event === 'update') {
                    render(frame.data);
                } else if (frame.event === 'error') {
                    showMessage(frame.data.message);
                }
            };
            socket.onclose = () => setTimeout(connect, 2000);
        }

        function showPanel(loggedIn) {
            document.getElementById('login').classList.toggle('hidden', loggedIn);
            document.getElementById('panel').classList.toggle('hidden', !loggedIn);
            if (socket) {
                socket.onclose = null;
                socket.close();
            }
            // The channel binds to the session cookie when it opens.
            connect();
        }

        document.getElementById('login-form').onsubmit = async (e) => {
            e.preventDefault();
            const response = await fetch('/admin/login', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ password: document.getElementById('password').value }),
            });
            const body = await response.json();
            if (body.success) {
                showMessage('');
                showPanel(true);
            } else {
                showMessage(body.message);
            }
        };

        document.getElementById('logout').onclick = async () => {
            await fetch('/admin/logout', { method: 'POST' });
            showPanel(false);
        };

        document.getElementById('incident-form').onsubmit = (e) => {
            e.preventDefault();
            const note = document.getElementById('note');
            send('addIncident', note.value);
            note.value = '';
        };

        for (const button of document.querySelectorAll('button[data-event]')) {
            button.onclick = () => {
                if (button.dataset.event !== 'reset' || confirm('Reset the counter?')) {
                    send(button.dataset.event);
                }
            };
        }

        fetch('/admin/check')
            .then((response) => response.json())
            .then((body) => showPanel(body.loggedIn));
    </script>
</body>
</html>
"#;
