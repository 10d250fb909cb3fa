//! Dashboard served at `/`.
//!
//! The script polls `/data`, `/stats` and `/history` and streams the log
//! console over `/ws`. Element ids match the JSON field names where possible.

pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Environmental Statistics</title>
<script src="https://cdn.jsdelivr.net/npm/chart.js@3.9.1/dist/chart.min.js"></script>
<style>
  body { font-family: system-ui, sans-serif; background: #f4f6f8; color: #222; margin: 0; padding: 16px; }
  h1 { font-size: 1.4em; margin: 0 0 12px; }
  .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(260px, 1fr)); gap: 12px; }
  .card { background: #fff; border-radius: 8px; padding: 14px; box-shadow: 0 1px 3px rgba(0,0,0,.12); }
  .big { font-size: 2.4em; font-weight: 600; }
  .row { display: flex; justify-content: space-between; margin: 4px 0; }
  .muted { color: #777; font-size: .85em; }
  #logConsole { background: #111; color: #9f9; font-family: monospace; font-size: .8em;
                height: 220px; overflow-y: auto; padding: 8px; border-radius: 6px; white-space: pre-wrap; }
  #wsStatus { display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: #c33; }
  #wsStatus.connected { background: #3c3; }
  button { padding: 6px 12px; }
</style>
</head>
<body>
<h1>Environmental Statistics</h1>
<div class="grid">
  <div class="card">
    <div class="muted">Temperature</div>
    <div class="big"><span id="temperature">--</span> °C</div>
    <div class="row"><span>Min</span><span id="minTemp">--</span></div>
    <div class="row"><span>Avg</span><span id="avgTemp">--</span></div>
    <div class="row"><span>Max</span><span id="maxTemp">--</span></div>
  </div>
  <div class="card">
    <div class="muted">Humidity</div>
    <div class="big"><span id="humidity">--</span> %</div>
    <div class="row"><span>Min</span><span id="minHumid">--</span></div>
    <div class="row"><span>Avg</span><span id="avgHumid">--</span></div>
    <div class="row"><span>Max</span><span id="maxHumid">--</span></div>
  </div>
  <div class="card">
    <div class="muted">Comfort</div>
    <div class="row"><span>Dew point</span><span><span id="dewPoint">--</span> °C</span></div>
    <div class="row"><span>Heat index</span><span><span id="heatIndex">--</span> °C</span></div>
    <button onclick="resetMinMax()">Reset min/max</button>
  </div>
  <div class="card">
    <div class="muted">System</div>
    <div class="row"><span>Uptime</span><span id="uptime">--</span></div>
    <div class="row"><span>Free memory</span><span id="freeHeap">--</span></div>
    <div class="row"><span>CPU</span><span id="cpuUsage">--</span></div>
    <div class="row"><span>SSID</span><span id="ssid">--</span></div>
    <div class="row"><span>RSSI</span><span id="rssi">--</span></div>
    <div class="row"><span>IP</span><span id="ipAddr">--</span></div>
    <div class="row"><span>Battery</span><span id="battery">--</span></div>
  </div>
</div>
<div class="card" style="margin-top:12px">
  <canvas id="historyChart" height="90"></canvas>
</div>
<div class="card" style="margin-top:12px">
  <div class="row"><span>Serial monitor</span>
    <span><span id="wsStatus"></span> <span id="wsStatusText">Disconnected</span></span></div>
  <div id="logConsole"></div>
</div>
<script>
  const $ = (id) => document.getElementById(id);
  const fmt = (v, d) => (typeof v === 'number' ? v.toFixed(d) : '--');
  let chart = null;

  function updateData() {
    fetch('/data').then(r => r.ok ? r.json() : Promise.reject(r.status)).then(d => {
      $('temperature').textContent = fmt(d.temperature, 1);
      $('humidity').textContent = fmt(d.humidity, 1);
      $('minTemp').textContent = fmt(d.minTemp, 1);
      $('maxTemp').textContent = fmt(d.maxTemp, 1);
      $('avgTemp').textContent = fmt(d.avgTemp, 1);
      $('minHumid').textContent = fmt(d.minHumid, 1);
      $('maxHumid').textContent = fmt(d.maxHumid, 1);
      $('avgHumid').textContent = fmt(d.avgHumid, 1);
      $('dewPoint').textContent = fmt(d.dewPoint, 1);
      $('heatIndex').textContent = fmt(d.heatIndex, 1);
    }).catch(() => { $('temperature').textContent = '--'; $('humidity').textContent = '--'; });
  }

  function updateStats() {
    fetch('/stats').then(r => r.json()).then(s => {
      $('uptime').textContent = s.uptime;
      $('freeHeap').textContent = s.freeHeap;
      $('cpuUsage').textContent = s.cpuUsage;
      $('ssid').textContent = s.ssid;
      $('rssi').textContent = s.rssi;
      $('ipAddr').textContent = s.ip;
      const b = s.battery;
      $('battery').textContent = b.percent + '% (' + b.voltage.toFixed(2) + 'V, ' + b.source + ')';
    }).catch(() => {});
  }

  function updateHistory() {
    fetch('/history').then(r => r.json()).then(h => {
      if (typeof Chart === 'undefined') return;
      if (!chart) {
        chart = new Chart($('historyChart'), {
          type: 'line',
          data: { labels: [], datasets: [
            { label: 'Temperature °C', data: [], borderColor: '#e4572e', yAxisID: 'y' },
            { label: 'Humidity %', data: [], borderColor: '#17becf', yAxisID: 'y1' } ] },
          options: { animation: false, scales: { y: { position: 'left' }, y1: { position: 'right' } } }
        });
      }
      chart.data.labels = h.labels;
      chart.data.datasets[0].data = h.temp;
      chart.data.datasets[1].data = h.humid;
      chart.update();
    }).catch(() => {});
  }

  function resetMinMax() {
    fetch('/reset').then(() => updateData());
  }

  function appendLog(line) {
    const el = $('logConsole');
    el.textContent += line + '\n';
    const lines = el.textContent.split('\n');
    if (lines.length > 200) el.textContent = lines.slice(-200).join('\n');
    el.scrollTop = el.scrollHeight;
  }

  function setWsState(connected) {
    $('wsStatus').className = connected ? 'connected' : '';
    $('wsStatusText').textContent = connected ? 'Connected' : 'Disconnected';
  }

  function connectWs() {
    const proto = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const ws = new WebSocket(proto + location.host + '/ws');
    ws.onopen = () => setWsState(true);
    ws.onmessage = (ev) => appendLog(ev.data);
    ws.onclose = () => { setWsState(false); setTimeout(connectWs, 3000); };
    ws.onerror = () => ws.close();
  }

  updateData(); updateStats(); updateHistory(); connectWs();
  setInterval(updateData, 3000);
  setInterval(updateStats, 5000);
  setInterval(updateHistory, 10000);
</script>
</body>
</html>
"##;
